use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::PinId;

pub const FAVORITES_FILE: &str = "favorites.json";

/// 收藏集合的持久化接口
///
/// 收藏只存在于本地，不与服务端同步。
pub trait FavoritesRepository {
    fn load(&self) -> Result<BTreeSet<PinId>>;
    fn save(&self, favorites: &BTreeSet<PinId>) -> Result<()>;
}

/// 以 JSON 数组形式保存在数据目录下
#[derive(Debug, Clone)]
pub struct FileFavorites {
    path: PathBuf,
}

impl FileFavorites {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(FAVORITES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesRepository for FileFavorites {
    fn load(&self) -> Result<BTreeSet<PinId>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let ids: Vec<PinId> = serde_json::from_str(&content)?;
        Ok(ids.into_iter().collect())
    }

    /// 每次整体重写
    fn save(&self, favorites: &BTreeSet<PinId>) -> Result<()> {
        let content = serde_json::to_string(favorites)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryFavorites;

#[cfg(test)]
mod memory {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    /// 测试用的内存实现，clone 之后共享同一份数据
    #[derive(Debug, Clone, Default)]
    pub struct MemoryFavorites {
        stored: Rc<RefCell<BTreeSet<PinId>>>,
        saves: Rc<Cell<usize>>,
    }

    impl MemoryFavorites {
        pub fn with(ids: &[i64]) -> Self {
            let repo = Self::default();
            repo.stored.borrow_mut().extend(ids.iter().copied().map(PinId));
            repo
        }

        pub fn stored(&self) -> BTreeSet<PinId> {
            self.stored.borrow().clone()
        }

        pub fn save_count(&self) -> usize {
            self.saves.get()
        }
    }

    impl FavoritesRepository for MemoryFavorites {
        fn load(&self) -> Result<BTreeSet<PinId>> {
            Ok(self.stored())
        }

        fn save(&self, favorites: &BTreeSet<PinId>) -> Result<()> {
            *self.stored.borrow_mut() = favorites.clone();
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }
}
