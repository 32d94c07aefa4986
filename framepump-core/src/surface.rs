//! Engine-owned surfaces and the explicit acquire/release discipline.
//!
//! A [`Surface`] is an opaque handle to a buffer owned by a transform engine
//! or frame pool. There is no collector to fall back on: every reference
//! taken with [`Surface::acquire`] must be returned with exactly one
//! [`Surface::release`], and the creation reference a surface starts with is
//! released by whoever the handle was handed to. Violations panic rather
//! than corrupt memory silently.
//!
//! [`SurfacePool`] allocates surfaces and keeps an instrumented ledger of
//! created and retired buffers, so a run can assert that nothing is left
//! outstanding at shutdown.

use crate::image::ImageInfo;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct PoolShared {
    info: ImageInfo,
    next_id: AtomicU64,
    created: AtomicUsize,
    retired: AtomicUsize,
}

struct SurfaceShared {
    id: u64,
    info: ImageInfo,
    // Reference count is atomic so a future threaded consumer stays sound;
    // the supported contract is single-threaded access.
    refs: AtomicU32,
    data: Mutex<Vec<u8>>,
    pool: Arc<PoolShared>,
}

/// Opaque handle to an engine- or pool-owned frame buffer.
///
/// Cloning a `Surface` aliases the same underlying buffer without touching
/// the reference count; taking a reference is always the explicit
/// [`acquire`](Surface::acquire) call.
pub struct Surface {
    shared: Arc<SurfaceShared>,
}

impl Surface {
    /// Identifier of the underlying buffer, unique within its pool.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Descriptor of the image held by this surface.
    pub fn info(&self) -> ImageInfo {
        self.shared.info
    }

    /// Current reference count. Zero means the buffer has been reclaimed.
    pub fn ref_count(&self) -> u32 {
        self.shared.refs.load(Ordering::Relaxed)
    }

    /// Take an additional reference, for a holder that needs the buffer to
    /// outlive the current call (e.g. an engine that retains input frames).
    ///
    /// # Panics
    ///
    /// Panics if the buffer has already been reclaimed.
    pub fn acquire(&self) {
        let prev = self.shared.refs.fetch_add(1, Ordering::Relaxed);
        assert!(prev != 0, "surface {} acquired after release", self.shared.id);
    }

    /// Drop one reference. When the count reaches zero the buffer is
    /// reclaimed and recorded as retired in the pool ledger.
    ///
    /// # Panics
    ///
    /// Panics if the count is already zero.
    pub fn release(&self) {
        let prev = self.shared.refs.fetch_sub(1, Ordering::Relaxed);
        assert!(prev != 0, "surface {} released twice", self.shared.id);
        if prev == 1 {
            self.shared.data.lock().clear();
            self.shared.pool.retired.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Map the plane data for reading.
    ///
    /// # Panics
    ///
    /// Panics if the buffer has been reclaimed.
    pub fn map(&self) -> MutexGuard<'_, Vec<u8>> {
        assert!(
            self.ref_count() != 0,
            "surface {} mapped after release",
            self.shared.id
        );
        self.shared.data.lock()
    }

    /// Map the plane data for writing.
    ///
    /// # Panics
    ///
    /// Panics if the buffer has been reclaimed.
    pub fn map_mut(&self) -> MutexGuard<'_, Vec<u8>> {
        self.map()
    }
}

impl Clone for Surface {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.shared.id)
            .field("info", &self.shared.info)
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// Allocator and lifetime ledger for [`Surface`]s of one descriptor.
pub struct SurfacePool {
    shared: Arc<PoolShared>,
}

impl SurfacePool {
    /// Create a pool producing surfaces with the given descriptor.
    pub fn new(info: ImageInfo) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                info,
                next_id: AtomicU64::new(0),
                created: AtomicUsize::new(0),
                retired: AtomicUsize::new(0),
            }),
        }
    }

    /// Descriptor of the surfaces this pool produces.
    pub fn info(&self) -> ImageInfo {
        self.shared.info
    }

    /// Allocate a zeroed surface with a reference count of one.
    pub fn alloc(&self) -> Surface {
        self.alloc_from(vec![0u8; self.shared.info.frame_size()])
    }

    /// Allocate a surface holding the given plane bytes, count of one.
    ///
    /// # Panics
    ///
    /// Panics if `data` does not match the pool descriptor's frame size.
    pub fn alloc_from(&self, data: Vec<u8>) -> Surface {
        assert_eq!(
            data.len(),
            self.shared.info.frame_size(),
            "plane data does not match pool descriptor {}",
            self.shared.info
        );
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.created.fetch_add(1, Ordering::Relaxed);
        Surface {
            shared: Arc::new(SurfaceShared {
                id,
                info: self.shared.info,
                refs: AtomicU32::new(1),
                data: Mutex::new(data),
                pool: Arc::clone(&self.shared),
            }),
        }
    }

    /// Total surfaces allocated over the pool's lifetime.
    pub fn created(&self) -> usize {
        self.shared.created.load(Ordering::Relaxed)
    }

    /// Surfaces whose reference count has reached zero.
    pub fn retired(&self) -> usize {
        self.shared.retired.load(Ordering::Relaxed)
    }

    /// Surfaces still holding at least one reference.
    pub fn outstanding(&self) -> usize {
        self.created() - self.retired()
    }
}

impl Clone for SurfacePool {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RawFormat;

    fn test_pool() -> SurfacePool {
        SurfacePool::new(ImageInfo::new(64, 48, RawFormat::Nv12))
    }

    #[test]
    fn test_alloc_starts_at_one() {
        let pool = test_pool();
        let surface = pool.alloc();
        assert_eq!(surface.ref_count(), 1);
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.outstanding(), 1);
    }

    #[test]
    fn test_acquire_release_pairs() {
        let pool = test_pool();
        let surface = pool.alloc();

        surface.acquire();
        assert_eq!(surface.ref_count(), 2);

        surface.release();
        assert_eq!(surface.ref_count(), 1);
        assert_eq!(pool.outstanding(), 1);

        surface.release();
        assert_eq!(surface.ref_count(), 0);
        assert_eq!(pool.retired(), 1);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_clone_is_an_alias() {
        let pool = test_pool();
        let surface = pool.alloc();
        let alias = surface.clone();
        assert_eq!(surface.ref_count(), 1);
        assert_eq!(alias.id(), surface.id());

        alias.release();
        assert_eq!(surface.ref_count(), 0);
    }

    #[test]
    #[should_panic(expected = "released twice")]
    fn test_double_release_panics() {
        let pool = test_pool();
        let surface = pool.alloc();
        surface.release();
        surface.release();
    }

    #[test]
    #[should_panic(expected = "acquired after release")]
    fn test_acquire_after_release_panics() {
        let pool = test_pool();
        let surface = pool.alloc();
        surface.release();
        surface.acquire();
    }

    #[test]
    #[should_panic(expected = "mapped after release")]
    fn test_map_after_release_panics() {
        let pool = test_pool();
        let surface = pool.alloc();
        surface.release();
        let _ = surface.map();
    }

    #[test]
    fn test_alloc_from_bytes() {
        let pool = test_pool();
        let size = pool.info().frame_size();
        let surface = pool.alloc_from(vec![0x5a; size]);
        assert_eq!(surface.map().len(), size);
        assert!(surface.map().iter().all(|&b| b == 0x5a));
        surface.release();
    }

    #[test]
    #[should_panic(expected = "does not match pool descriptor")]
    fn test_alloc_from_wrong_size_panics() {
        let pool = test_pool();
        let _ = pool.alloc_from(vec![0u8; 3]);
    }

    #[test]
    fn test_write_through_map_mut() {
        let pool = test_pool();
        let surface = pool.alloc();
        surface.map_mut()[0] = 0xff;
        assert_eq!(surface.map()[0], 0xff);
        surface.release();
    }
}
