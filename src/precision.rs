//! Precision-family dispatch onto the native symbol sets.
//!
//! FFTW ships two parallel C APIs for the two supported precisions: the
//! `fftw_*` symbols operate on double-precision samples and the `fftwf_*`
//! symbols on single-precision ones. The two families share nothing at the
//! native level, including their planner state, so each gets its own
//! process-wide create/destroy lock here.

use std::os::raw::{c_int, c_uint, c_void};
use std::sync::Mutex;

use num_complex::{Complex32, Complex64};

mod sealed {
    pub trait Sealed {}
    impl Sealed for f64 {}
    impl Sealed for f32 {}
}

// FFTW's documentation on thread safety: plan creation and destruction share
// planner state and must never run concurrently, while executing distinct
// plans is safe. One lock per precision family, held for every native
// create/destroy in the process.
static DOUBLE_PLANNER_LOCK: Mutex<()> = Mutex::new(());
static SINGLE_PLANNER_LOCK: Mutex<()> = Mutex::new(());

/// A floating-point precision family of the native engine.
///
/// Implemented by [`f64`] (routing to the `fftw_*` symbols) and [`f32`]
/// (routing to `fftwf_*`). Sealed: the native engine defines exactly these
/// two families.
pub trait Precision: sealed::Sealed + Copy + Send + Sync + 'static {
    /// Complex sample type handed to the native engine.
    type Complex: Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static;

    /// Opaque native plan handle.
    type NativePlan: Copy;

    /// Lock serializing native plan creation and destruction for this
    /// family. Never held across execution.
    fn planner_lock() -> &'static Mutex<()>;

    /// Allocate `len` complex samples with the native engine's alignment.
    ///
    /// # Safety
    /// `len` must be non-zero. The returned pointer must be released with
    /// [`Precision::free_complex`] exactly once.
    unsafe fn alloc_complex(len: usize) -> *mut Self::Complex;

    /// Release an allocation obtained from [`Precision::alloc_complex`].
    ///
    /// # Safety
    /// `ptr` must come from `alloc_complex` and must not be used afterwards.
    unsafe fn free_complex(ptr: *mut Self::Complex);

    /// Create a native plan for a dense row-major transform over `dims`.
    /// Returns `None` when the native planner rejects the request.
    ///
    /// # Safety
    /// `input` and `output` must point at allocations of at least
    /// `dims.iter().product()` samples that stay valid for the lifetime of
    /// the returned handle. The caller must hold [`Precision::planner_lock`].
    unsafe fn plan_dft(
        dims: &[c_int],
        input: *mut Self::Complex,
        output: *mut Self::Complex,
        sign: c_int,
        flags: c_uint,
    ) -> Option<Self::NativePlan>;

    /// Run the transform behind `handle` on the currently bound buffers.
    ///
    /// # Safety
    /// `handle` must be a live handle from [`Precision::plan_dft`], and no
    /// other execution of the same handle may be in flight.
    unsafe fn execute_plan(handle: Self::NativePlan);

    /// Release all native resources behind `handle`.
    ///
    /// # Safety
    /// `handle` must be a live handle from [`Precision::plan_dft`]; it must
    /// not be used afterwards. The caller must hold
    /// [`Precision::planner_lock`].
    unsafe fn destroy_plan(handle: Self::NativePlan);
}

impl Precision for f64 {
    type Complex = Complex64;
    type NativePlan = fftw_sys::fftw_plan;

    fn planner_lock() -> &'static Mutex<()> {
        &DOUBLE_PLANNER_LOCK
    }

    unsafe fn alloc_complex(len: usize) -> *mut Self::Complex {
        fftw_sys::fftw_alloc_complex(len) as *mut Self::Complex
    }

    unsafe fn free_complex(ptr: *mut Self::Complex) {
        fftw_sys::fftw_free(ptr as *mut c_void);
    }

    unsafe fn plan_dft(
        dims: &[c_int],
        input: *mut Self::Complex,
        output: *mut Self::Complex,
        sign: c_int,
        flags: c_uint,
    ) -> Option<Self::NativePlan> {
        let handle = fftw_sys::fftw_plan_dft(
            dims.len() as c_int,
            dims.as_ptr() as *mut c_int,
            input as *mut fftw_sys::fftw_complex,
            output as *mut fftw_sys::fftw_complex,
            sign,
            flags,
        );
        if handle.is_null() {
            None
        } else {
            Some(handle)
        }
    }

    unsafe fn execute_plan(handle: Self::NativePlan) {
        fftw_sys::fftw_execute(handle);
    }

    unsafe fn destroy_plan(handle: Self::NativePlan) {
        fftw_sys::fftw_destroy_plan(handle);
    }
}

impl Precision for f32 {
    type Complex = Complex32;
    type NativePlan = fftw_sys::fftwf_plan;

    fn planner_lock() -> &'static Mutex<()> {
        &SINGLE_PLANNER_LOCK
    }

    unsafe fn alloc_complex(len: usize) -> *mut Self::Complex {
        fftw_sys::fftwf_alloc_complex(len) as *mut Self::Complex
    }

    unsafe fn free_complex(ptr: *mut Self::Complex) {
        fftw_sys::fftwf_free(ptr as *mut c_void);
    }

    unsafe fn plan_dft(
        dims: &[c_int],
        input: *mut Self::Complex,
        output: *mut Self::Complex,
        sign: c_int,
        flags: c_uint,
    ) -> Option<Self::NativePlan> {
        let handle = fftw_sys::fftwf_plan_dft(
            dims.len() as c_int,
            dims.as_ptr() as *mut c_int,
            input as *mut fftw_sys::fftwf_complex,
            output as *mut fftw_sys::fftwf_complex,
            sign,
            flags,
        );
        if handle.is_null() {
            None
        } else {
            Some(handle)
        }
    }

    unsafe fn execute_plan(handle: Self::NativePlan) {
        fftw_sys::fftwf_execute(handle);
    }

    unsafe fn destroy_plan(handle: Self::NativePlan) {
        fftw_sys::fftwf_destroy_plan(handle);
    }
}
