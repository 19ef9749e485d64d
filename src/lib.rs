//! Safe, reusable plan handles over the FFTW multidimensional transform engine.
//!
//! FFTW separates *planning* (expensive, chooses a transform strategy for a
//! fixed shape and pair of buffers) from *execution* (cheap, runs the chosen
//! strategy as often as desired). This crate mirrors that split with two core
//! types:
//!
//! - [`AlignedArray`]: a dense row-major complex array in FFTW-aligned memory
//! - [`Plan`]: a bound, executable transform between two same-shape arrays
//!
//! Both are generic over the [`Precision`] family (`f64` routes to the
//! `fftw_*` symbols, `f32` to `fftwf_*`).
//!
//! # Example
//!
//! ```no_run
//! use fftw_rs::{AlignedArray, Direction, Flag, Plan};
//! use num_complex::Complex64;
//!
//! let mut signal: AlignedArray = AlignedArray::new(&[16]).unwrap();
//! for i in 0..16 {
//!     signal.set(&[i], Complex64::new(i as f64, 0.0)).unwrap();
//! }
//!
//! // In-place forward transform, re-executable any number of times.
//! let mut plan = Plan::new(&signal, &signal, Direction::Forward, Flag::ESTIMATE).unwrap();
//! plan.execute();
//! ```
//!
//! # Resource model
//!
//! An [`AlignedArray`] owns its buffer through a shared allocation that every
//! [`Plan`] bound to it also holds. The buffer's address is therefore stable
//! and its lifetime covers every plan that points native code at it, with no
//! action required from the caller. Dropping a plan releases the native plan
//! handle and its hold on both buffers, exactly once.
//!
//! # Threading
//!
//! FFTW documents its planner as not thread-safe while execution of distinct
//! plans is. Accordingly, every native plan creation and destruction in the
//! process is serialized behind one lock per precision family, and
//! [`Plan::execute`] is left unserialized. A single plan must not be executed
//! while its bound arrays are mutated from another thread; that obligation is
//! the caller's, as it is in the native API.

mod array;
mod copy;
mod plan;
mod precision;

// ============================================================================
// Array types
// ============================================================================
pub use array::AlignedArray;

// ============================================================================
// Nested-sequence validation and copying
// ============================================================================
pub use copy::{copy_nested2_into, copy_nested3_into, nested_dims2, nested_dims3};

// ============================================================================
// Plans
// ============================================================================
pub use plan::{fft, ifft, Direction, Flag, Plan};

// ============================================================================
// Precision dispatch
// ============================================================================
pub use precision::Precision;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur while building arrays, validating nested input, or
/// creating plans.
#[derive(Debug, thiserror::Error)]
pub enum FftwError {
    /// An extent (or the total element count) exceeds what the native
    /// planner's index type can express.
    #[error("shape {0:?} exceeds the native planner's dimension limits")]
    ShapeTooLarge(Vec<usize>),

    /// Index arity differs from the array rank.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// An access coordinate falls outside the array's shape.
    #[error("index {index:?} out of range for shape {shape:?}")]
    IndexOutOfRange { index: Vec<usize>, shape: Vec<usize> },

    /// Nested input sequences are not rectangular.
    #[error("jagged nested input: found {shape:?} then length {found} at depth {depth}")]
    JaggedArray {
        shape: Vec<usize>,
        found: usize,
        depth: usize,
    },

    /// Two shapes that must agree do not.
    #[error("dimensions mismatch: dst {dst:?}, src {src:?}")]
    DimensionsMismatch { dst: Vec<usize>, src: Vec<usize> },

    /// The native planner returned a null handle.
    #[error("native planner rejected the transform")]
    PlanCreation,
}

/// Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, FftwError>;
