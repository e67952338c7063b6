use super::DatasetBundle;
use crate::config::DataConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

static SHARED: DatasetCache = DatasetCache::new();

/// Loads the dataset at most once; concurrent first callers block on the
/// same load and observe the same bundle.
#[derive(Debug)]
pub struct DatasetCache {
    bundle: OnceLock<DatasetBundle>,
    loads: AtomicUsize,
}

impl DatasetCache {
    pub const fn new() -> Self {
        Self {
            bundle: OnceLock::new(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn get_or_load(&self, config: &DataConfig) -> &DatasetBundle {
        self.get_or_init(|| DatasetBundle::load(config))
    }

    pub fn get_or_init(&self, load: impl FnOnce() -> DatasetBundle) -> &DatasetBundle {
        self.bundle.get_or_init(|| {
            self.loads.fetch_add(1, Ordering::SeqCst);
            load()
        })
    }

    pub fn get(&self) -> Option<&DatasetBundle> {
        self.bundle.get()
    }

    /// Number of times the loader actually ran.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide bundle. The first call's configuration wins.
pub fn shared(config: &DataConfig) -> &'static DatasetBundle {
    SHARED.get_or_load(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::dataset::DatasetBuilder;
    use std::io::Cursor;

    #[test]
    fn concurrent_first_access_loads_once() {
        let cache = DatasetCache::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let bundle = cache.get_or_init(|| {
                        DatasetBuilder::new()
                            .master(Cursor::new("Suburb\nUNLEY\n"))
                            .build()
                    });
                    assert_eq!(bundle.regions().len(), 1);
                });
            }
        });
        assert_eq!(cache.loads(), 1);
        assert!(cache.get().is_some());
    }
}
