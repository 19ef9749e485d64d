//! Shape validation and bulk copying of nested sequences.
//!
//! Nested `Vec`s are the convenient way to author multidimensional input,
//! but the native engine needs a flat, shape-known buffer. This module is
//! the single place where rectangularity is enforced: [`nested_dims2`] and
//! [`nested_dims3`] either compute the shape of a nested sequence or report
//! where it stops being rectangular, and the `copy_nested*_into` functions
//! move validated data into an [`AlignedArray`] element-for-element.

use crate::precision::Precision;
use crate::{AlignedArray, FftwError, Result};

/// Shape of a depth-2 nested sequence.
///
/// An empty outer sequence has shape `(0, 0)`. Otherwise every inner
/// sequence must have the length of the first.
///
/// # Errors
/// [`FftwError::JaggedArray`] naming the shape observed so far and the first
/// diverging length.
pub fn nested_dims2<T, Row>(src: &[Row]) -> Result<(usize, usize)>
where
    Row: AsRef<[T]>,
{
    let dim0 = src.len();
    if dim0 == 0 {
        return Ok((0, 0));
    }
    let dim1 = src[0].as_ref().len();
    for row in src {
        let len = row.as_ref().len();
        if len != dim1 {
            return Err(FftwError::JaggedArray {
                shape: vec![dim0, dim1],
                found: len,
                depth: 1,
            });
        }
    }
    Ok((dim0, dim1))
}

/// Shape of a depth-3 nested sequence; same rule as [`nested_dims2`] one
/// level deeper, failing at whichever depth first diverges.
pub fn nested_dims3<T, Row, Page>(src: &[Page]) -> Result<(usize, usize, usize)>
where
    Page: AsRef<[Row]>,
    Row: AsRef<[T]>,
{
    let dim0 = src.len();
    if dim0 == 0 {
        return Ok((0, 0, 0));
    }
    let first_page = src[0].as_ref();
    let dim1 = first_page.len();
    let dim2 = if dim1 == 0 {
        0
    } else {
        first_page[0].as_ref().len()
    };
    for page in src {
        let page = page.as_ref();
        if page.len() != dim1 {
            return Err(FftwError::JaggedArray {
                shape: vec![dim0, dim1, dim2],
                found: page.len(),
                depth: 1,
            });
        }
        for row in page {
            let len = row.as_ref().len();
            if len != dim2 {
                return Err(FftwError::JaggedArray {
                    shape: vec![dim0, dim1, dim2],
                    found: len,
                    depth: 2,
                });
            }
        }
    }
    Ok((dim0, dim1, dim2))
}

/// Copy a depth-2 nested sequence into a rank-2 array of the same shape.
///
/// Values are copied positionally and bit-exactly; once the shapes agree the
/// copy cannot fail and never partially applies.
///
/// # Errors
/// [`FftwError::JaggedArray`] when the source is not rectangular,
/// [`FftwError::DimensionsMismatch`] when its shape (or rank) differs from
/// the destination's.
pub fn copy_nested2_into<P, Row>(dst: &mut AlignedArray<P>, src: &[Row]) -> Result<()>
where
    P: Precision,
    Row: AsRef<[P::Complex]>,
{
    let (src0, src1) = nested_dims2(src)?;
    if dst.dims() != [src0, src1] {
        return Err(FftwError::DimensionsMismatch {
            dst: dst.dims().to_vec(),
            src: vec![src0, src1],
        });
    }
    if dst.len() == 0 {
        return Ok(());
    }
    for (flat_row, row) in dst.as_slice_mut().chunks_exact_mut(src1).zip(src) {
        flat_row.copy_from_slice(row.as_ref());
    }
    Ok(())
}

/// Copy a depth-3 nested sequence into a rank-3 array of the same shape.
///
/// # Errors
/// Same conditions as [`copy_nested2_into`].
pub fn copy_nested3_into<P, Row, Page>(dst: &mut AlignedArray<P>, src: &[Page]) -> Result<()>
where
    P: Precision,
    Page: AsRef<[Row]>,
    Row: AsRef<[P::Complex]>,
{
    let (src0, src1, src2) = nested_dims3(src)?;
    if dst.dims() != [src0, src1, src2] {
        return Err(FftwError::DimensionsMismatch {
            dst: dst.dims().to_vec(),
            src: vec![src0, src1, src2],
        });
    }
    if dst.len() == 0 {
        return Ok(());
    }
    let rows = src.iter().flat_map(|page| page.as_ref().iter());
    for (flat_row, row) in dst.as_slice_mut().chunks_exact_mut(src2).zip(rows) {
        flat_row.copy_from_slice(row.as_ref());
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
