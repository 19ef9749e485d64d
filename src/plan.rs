//! Transform plans over pairs of aligned arrays.
//!
//! A [`Plan`] couples one input and one output array of identical shape
//! (possibly the same array, for an in-place transform) with a
//! [`Direction`] and a planning-effort [`Flag`], and owns the resulting
//! native plan handle. Executing is cheap and repeatable; creation and
//! destruction are serialized process-wide per precision family because the
//! native planner is documented as not thread-safe.

use std::os::raw::{c_int, c_uint};
use std::sync::{Arc, PoisonError};

use log::trace;

use crate::array::AlignedBuf;
use crate::precision::Precision;
use crate::{AlignedArray, FftwError, Result};

// ============================================================================
// Direction and planner flags
// ============================================================================

/// Transform orientation, in the native engine's sign convention.
///
/// Neither direction normalizes: a forward transform followed by a backward
/// one scales every sample by the total element count.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `FFTW_FORWARD`.
    Forward = -1,
    /// `FFTW_BACKWARD`.
    Backward = 1,
}

impl Direction {
    #[inline]
    fn sign(self) -> c_int {
        self as i32 as c_int
    }
}

/// Planning-effort selector and modifiers, passed through to the native
/// planner unchanged.
///
/// The values mirror the native flag macros. Combine with `|`:
///
/// ```
/// use fftw_rs::Flag;
/// let flags = Flag::MEASURE | Flag::DESTROY_INPUT;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(u32);

impl Flag {
    /// Measure actual execution times of candidate strategies (`FFTW_MEASURE`).
    pub const MEASURE: Flag = Flag(0);
    /// The transform may scribble over its input (`FFTW_DESTROY_INPUT`).
    pub const DESTROY_INPUT: Flag = Flag(1 << 0);
    /// Do not require aligned buffers on execution (`FFTW_UNALIGNED`).
    pub const UNALIGNED: Flag = Flag(1 << 1);
    /// `FFTW_CONSERVE_MEMORY`.
    pub const CONSERVE_MEMORY: Flag = Flag(1 << 2);
    /// Widest planning search (`FFTW_EXHAUSTIVE`).
    pub const EXHAUSTIVE: Flag = Flag(1 << 3);
    /// The transform must not touch its input (`FFTW_PRESERVE_INPUT`).
    pub const PRESERVE_INPUT: Flag = Flag(1 << 4);
    /// Wider planning search than `MEASURE` (`FFTW_PATIENT`).
    pub const PATIENT: Flag = Flag(1 << 5);
    /// Cheap heuristic planning, no measurement (`FFTW_ESTIMATE`).
    pub const ESTIMATE: Flag = Flag(1 << 6);
    /// Only use an already-known strategy (`FFTW_WISDOM_ONLY`).
    pub const WISDOM_ONLY: Flag = Flag(1 << 21);

    /// The raw bit pattern handed to the native planner.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for Flag {
    type Output = Flag;

    fn bitor(self, rhs: Flag) -> Flag {
        Flag(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Flag {
    fn bitor_assign(&mut self, rhs: Flag) {
        self.0 |= rhs.0;
    }
}

// ============================================================================
// Plan
// ============================================================================

/// A bound, executable transform between two fixed arrays.
///
/// The plan holds a shared handle on both buffers for its whole lifetime, so
/// the raw pointers baked into the native plan stay valid however the caller
/// drops things. Dropping the plan (or calling [`Plan::destroy`]) releases
/// the native handle and both buffer holds exactly once.
///
/// # Caller obligations
///
/// Executions of a *single* plan must not overlap — enforced here by
/// `&mut self`. Mutating a bound array while the same plan executes on
/// another thread is a data race the native contract cannot detect; keep
/// mutation and execution of one plan on one thread, as with the native API.
pub struct Plan<P: Precision = f64> {
    handle: P::NativePlan,
    input: Arc<AlignedBuf<P>>,
    output: Arc<AlignedBuf<P>>,
    dims: Arc<[usize]>,
    direction: Direction,
    flags: Flag,
}

// Safety: the native handle is owned exclusively by this value and execution
// requires `&mut self`; the buffers themselves are Send + Sync. Shared
// references only expose introspection.
unsafe impl<P: Precision> Send for Plan<P> {}
unsafe impl<P: Precision> Sync for Plan<P> {}

impl<P: Precision> Plan<P> {
    /// Bind `input` and `output` into an executable plan.
    ///
    /// The two arrays must have identical extents; passing the same array
    /// twice plans an in-place transform. Planning with a measuring [`Flag`]
    /// overwrites both buffers with scratch data; with [`Flag::ESTIMATE`]
    /// the contents survive planning.
    ///
    /// # Errors
    /// [`FftwError::DimensionsMismatch`] when the extents differ,
    /// [`FftwError::PlanCreation`] when the native planner returns null.
    /// Either failure leaves no native resource behind.
    ///
    /// # Panics
    /// When `input` has rank 0 or zero total elements. An empty transform is
    /// a usage-contract violation the native engine has no answer for, so it
    /// is rejected loudly rather than encoded as a recoverable error.
    pub fn new(
        input: &AlignedArray<P>,
        output: &AlignedArray<P>,
        direction: Direction,
        flags: Flag,
    ) -> Result<Self> {
        assert!(
            input.rank() > 0 && !input.is_empty(),
            "plan input and output must be non-empty"
        );
        if input.dims() != output.dims() {
            return Err(FftwError::DimensionsMismatch {
                dst: output.dims().to_vec(),
                src: input.dims().to_vec(),
            });
        }

        // Extents were validated against the native index type at array
        // construction.
        let native_dims: Vec<c_int> = input.dims().iter().map(|&d| d as c_int).collect();

        let handle = {
            let _guard = P::planner_lock()
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            unsafe {
                P::plan_dft(
                    &native_dims,
                    input.buffer().as_ptr(),
                    output.buffer().as_ptr(),
                    direction.sign(),
                    flags.bits() as c_uint,
                )
            }
        }
        .ok_or(FftwError::PlanCreation)?;

        trace!("created {direction:?} plan over {:?}", input.dims());

        Ok(Self {
            handle,
            input: Arc::clone(input.buffer()),
            output: Arc::clone(output.buffer()),
            dims: Arc::clone(input.shared_dims()),
            direction,
            flags,
        })
    }

    /// Run the transform on whatever currently resides in the bound input
    /// buffer, writing into the bound output buffer.
    ///
    /// Returns `self` for chaining. Deliberately not serialized: distinct
    /// plans may execute concurrently.
    pub fn execute(&mut self) -> &mut Self {
        unsafe { P::execute_plan(self.handle) };
        self
    }

    /// Release the plan now.
    ///
    /// Equivalent to dropping; spelled out for call sites where the release
    /// is the point. Consuming `self` makes use-after-destroy and double
    /// destroy unrepresentable.
    pub fn destroy(self) {}

    /// Extents of the bound arrays.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Direction this plan was created with.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Planner flags this plan was created with.
    #[inline]
    pub fn flags(&self) -> Flag {
        self.flags
    }

    /// Whether input and output are the same buffer (in-place transform).
    #[inline]
    pub fn is_in_place(&self) -> bool {
        Arc::ptr_eq(&self.input, &self.output)
    }
}

impl<P: Precision> Drop for Plan<P> {
    fn drop(&mut self) {
        {
            let _guard = P::planner_lock()
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            unsafe { P::destroy_plan(self.handle) };
        }
        trace!("destroyed plan over {:?}", self.dims);
        // The buffer holds drop with the struct fields, strictly after the
        // native handle is gone.
    }
}

impl<P: Precision> std::fmt::Debug for Plan<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plan")
            .field("dims", &self.dims)
            .field("direction", &self.direction)
            .field("flags", &self.flags)
            .field("in_place", &self.is_in_place())
            .finish()
    }
}

// ============================================================================
// One-shot transforms
// ============================================================================

/// Forward-transform `input` into a freshly allocated same-shape array.
///
/// Plans with [`Flag::ESTIMATE`], executes once, and releases the plan;
/// `input` is left untouched. Unnormalized.
///
/// # Panics
/// When `input` is empty (see [`Plan::new`]).
pub fn fft<P: Precision>(input: &AlignedArray<P>) -> Result<AlignedArray<P>> {
    one_shot(input, Direction::Forward)
}

/// Backward-transform `input` into a freshly allocated same-shape array.
///
/// Unnormalized: `ifft(fft(x))` scales every sample of `x` by the total
/// element count.
///
/// # Panics
/// When `input` is empty (see [`Plan::new`]).
pub fn ifft<P: Precision>(input: &AlignedArray<P>) -> Result<AlignedArray<P>> {
    one_shot(input, Direction::Backward)
}

fn one_shot<P: Precision>(input: &AlignedArray<P>, direction: Direction) -> Result<AlignedArray<P>> {
    let output = AlignedArray::new(input.dims())?;
    Plan::new(input, &output, direction, Flag::ESTIMATE)?.execute();
    Ok(output)
}

// ============================================================================
// Tests
// ============================================================================
