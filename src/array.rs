//! Dense complex arrays in FFTW-aligned memory.
//!
//! [`AlignedArray`] is the dynamic-rank dense array handed to plans. Its
//! storage comes from the native aligned allocator (so the engine's SIMD
//! kernels see the alignment they were compiled for) and is held behind an
//! `Arc` that every bound [`Plan`](crate::Plan) clones: as long as any plan
//! points native code at the buffer, the allocation cannot move or die.

use std::alloc::{handle_alloc_error, Layout};
use std::ops::{Index, IndexMut};
use std::os::raw::c_int;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::precision::Precision;
use crate::{FftwError, Result};

// ============================================================================
// AlignedBuf
// ============================================================================

/// Raw natively-aligned allocation of complex samples.
///
/// Freed through the matching native free exactly once, on drop of the last
/// `Arc` holding it.
pub(crate) struct AlignedBuf<P: Precision> {
    ptr: NonNull<P::Complex>,
    len: usize,
}

// Safety: the buffer is plain memory with no interior state; access
// discipline (no unsynchronized concurrent writes) is the responsibility of
// the owning array and plan types, as documented on `Plan::execute`.
unsafe impl<P: Precision> Send for AlignedBuf<P> {}
unsafe impl<P: Precision> Sync for AlignedBuf<P> {}

impl<P: Precision> AlignedBuf<P> {
    /// Allocate `len` zero-initialized samples. A zero-length buffer is legal
    /// and allocates nothing.
    fn alloc(len: usize) -> Self {
        if len == 0 {
            return Self {
                ptr: NonNull::dangling(),
                len: 0,
            };
        }
        let ptr = unsafe { P::alloc_complex(len) };
        let Some(ptr) = NonNull::new(ptr) else {
            handle_alloc_error(Layout::array::<P::Complex>(len).expect("buffer layout"));
        };
        // The native allocator leaves contents unspecified; fresh arrays are
        // documented to start at zero.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, len) };
        Self { ptr, len }
    }

    /// Raw base pointer handed to the native engine.
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut P::Complex {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl<P: Precision> Drop for AlignedBuf<P> {
    fn drop(&mut self) {
        if self.len != 0 {
            unsafe { P::free_complex(self.ptr.as_ptr()) };
        }
    }
}

// ============================================================================
// AlignedArray
// ============================================================================

/// Dense row-major complex array in natively-aligned memory.
///
/// The last dimension varies fastest. Any extent may be zero, giving a legal
/// empty array. Samples start zeroed.
pub struct AlignedArray<P: Precision = f64> {
    buf: Arc<AlignedBuf<P>>,
    dims: Arc<[usize]>,
}

impl<P: Precision> std::fmt::Debug for AlignedArray<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedArray")
            .field("dims", &self.dims)
            .finish()
    }
}

impl<P: Precision> AlignedArray<P> {
    /// Create a zeroed array with the given extents.
    ///
    /// # Errors
    /// [`FftwError::ShapeTooLarge`] when an extent (or the total element
    /// count) does not fit the native planner's index type.
    pub fn new(dims: &[usize]) -> Result<Self> {
        let mut total = 1usize;
        for &d in dims {
            if d > c_int::MAX as usize {
                return Err(FftwError::ShapeTooLarge(dims.to_vec()));
            }
            total = total
                .checked_mul(d)
                .ok_or_else(|| FftwError::ShapeTooLarge(dims.to_vec()))?;
        }
        Ok(Self {
            buf: Arc::new(AlignedBuf::alloc(total)),
            dims: Arc::from(dims),
        })
    }

    /// Create an array with values produced by a function.
    ///
    /// The function is called with indices in row-major iteration order.
    pub fn from_fn(dims: &[usize], mut f: impl FnMut(&[usize]) -> P::Complex) -> Result<Self> {
        let mut array = Self::new(dims)?;
        let rank = dims.len();
        let mut idx = vec![0usize; rank];
        for slot in array.as_slice_mut() {
            *slot = f(&idx);
            for d in (0..rank).rev() {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Ok(array)
    }

    /// Per-dimension extents.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the array holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    /// Read the sample at `indices`.
    ///
    /// # Errors
    /// [`FftwError::RankMismatch`] on wrong index arity,
    /// [`FftwError::IndexOutOfRange`] on an out-of-range coordinate.
    pub fn at(&self, indices: &[usize]) -> Result<P::Complex> {
        let offset = self.flat_offset(indices)?;
        Ok(unsafe { *self.buf.as_ptr().add(offset) })
    }

    /// Write the sample at `indices`.
    ///
    /// # Errors
    /// Same conditions as [`AlignedArray::at`].
    pub fn set(&mut self, indices: &[usize], value: P::Complex) -> Result<()> {
        let offset = self.flat_offset(indices)?;
        unsafe { *self.buf.as_ptr().add(offset) = value };
        Ok(())
    }

    /// The flat row-major sample storage.
    #[inline]
    pub fn as_slice(&self) -> &[P::Complex] {
        unsafe { std::slice::from_raw_parts(self.buf.as_ptr(), self.buf.len()) }
    }

    /// Mutable view of the flat row-major sample storage.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [P::Complex] {
        unsafe { std::slice::from_raw_parts_mut(self.buf.as_ptr(), self.buf.len()) }
    }

    /// Shared handle on the backing buffer, cloned by plans as their pin.
    #[inline]
    pub(crate) fn buffer(&self) -> &Arc<AlignedBuf<P>> {
        &self.buf
    }

    /// Shared handle on the extents, cloned into plans.
    #[inline]
    pub(crate) fn shared_dims(&self) -> &Arc<[usize]> {
        &self.dims
    }

    /// Row-major flat offset of `indices`, fully validated.
    fn flat_offset(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.dims.len() {
            return Err(FftwError::RankMismatch(indices.len(), self.dims.len()));
        }
        let mut offset = 0usize;
        for (&index, &dim) in indices.iter().zip(self.dims.iter()) {
            if index >= dim {
                return Err(FftwError::IndexOutOfRange {
                    index: indices.to_vec(),
                    shape: self.dims.to_vec(),
                });
            }
            offset = offset * dim + index;
        }
        Ok(offset)
    }
}

impl<P: Precision> Index<&[usize]> for AlignedArray<P> {
    type Output = P::Complex;

    fn index(&self, indices: &[usize]) -> &P::Complex {
        let offset = self.flat_offset(indices).expect("index within shape");
        unsafe { &*self.buf.as_ptr().add(offset) }
    }
}

impl<P: Precision> IndexMut<&[usize]> for AlignedArray<P> {
    fn index_mut(&mut self, indices: &[usize]) -> &mut P::Complex {
        let offset = self.flat_offset(indices).expect("index within shape");
        unsafe { &mut *self.buf.as_ptr().add(offset) }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    #[test]
    fn new_reports_dims_and_len() {
        for n in [10usize, 100, 1000] {
            let a: AlignedArray = AlignedArray::new(&[n]).unwrap();
            assert_eq!(a.dims(), &[n]);
            assert_eq!(a.len(), n);
            assert_eq!(a.rank(), 1);
        }

        let a: AlignedArray = AlignedArray::new(&[100, 50]).unwrap();
        assert_eq!(a.dims(), &[100, 50]);
        assert_eq!(a.len(), 5000);

        let a: AlignedArray<f32> = AlignedArray::new(&[100, 20, 10]).unwrap();
        assert_eq!(a.dims(), &[100, 20, 10]);
        assert_eq!(a.len(), 20000);
    }

    #[test]
    fn fresh_arrays_are_zeroed() {
        let a: AlignedArray = AlignedArray::new(&[8, 4]).unwrap();
        assert!(a.as_slice().iter().all(|&v| v == Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn zero_extent_is_legal_and_empty() {
        for dims in [&[0usize][..], &[0, 0][..], &[3, 0][..], &[0, 4, 2][..], &[][..]] {
            let a: AlignedArray = AlignedArray::new(dims).unwrap();
            assert_eq!(a.dims(), dims);
            if dims.is_empty() {
                assert_eq!(a.len(), 1);
            } else {
                assert!(a.is_empty());
                assert_eq!(a.as_slice().len(), 0);
            }
        }
    }

    #[test]
    fn set_then_at_walks_row_major() {
        let mut a: AlignedArray = AlignedArray::new(&[3, 4]).unwrap();
        let mut counter = 0.0;
        for i in 0..3 {
            for j in 0..4 {
                a.set(&[i, j], Complex64::new(counter, 0.0)).unwrap();
                counter += 1.0;
            }
        }
        // Row-major: the flat storage is the same counter walk.
        for (k, v) in a.as_slice().iter().enumerate() {
            assert_eq!(v.re, k as f64);
        }
        assert_eq!(a.at(&[2, 3]).unwrap(), Complex64::new(11.0, 0.0));
        assert_eq!(a[&[1, 2][..]], Complex64::new(6.0, 0.0));
    }

    #[test]
    fn from_fn_fills_in_index_order() {
        let a: AlignedArray<f32> = AlignedArray::from_fn(&[2, 3, 4], |idx| {
            Complex32::new((idx[0] * 12 + idx[1] * 4 + idx[2]) as f32, 0.0)
        })
        .unwrap();
        for (k, v) in a.as_slice().iter().enumerate() {
            assert_eq!(v.re, k as f32);
        }
    }

    #[test]
    fn out_of_range_and_arity_errors() {
        let mut a: AlignedArray = AlignedArray::new(&[2, 3]).unwrap();
        assert!(matches!(
            a.at(&[2, 0]),
            Err(FftwError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            a.set(&[0, 3], Complex64::new(1.0, 0.0)),
            Err(FftwError::IndexOutOfRange { .. })
        ));
        assert!(matches!(a.at(&[0]), Err(FftwError::RankMismatch(1, 2))));
        assert!(matches!(
            a.at(&[0, 0, 0]),
            Err(FftwError::RankMismatch(3, 2))
        ));
    }

    #[test]
    fn oversized_extents_are_rejected_before_allocating() {
        let too_big = c_int::MAX as usize + 1;
        assert!(matches!(
            AlignedArray::<f64>::new(&[too_big, 0]),
            Err(FftwError::ShapeTooLarge(_))
        ));
        assert!(matches!(
            AlignedArray::<f64>::new(&[usize::MAX, 2]),
            Err(FftwError::ShapeTooLarge(_))
        ));
    }
}
