use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::{debug, info};

use crate::catalog::variables::FastSet;
use crate::catalog::{FilePath, GameLevel};
use crate::codec::ChunkType;
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use super::paths::{effective_paths, normalize, resolve};
use super::Archive;

/// Loads a level and its dependent chunk files exactly once.
///
/// [`ArchiveLoader::open`] only reads the top-level level file, which is
/// enough for level listings. [`ArchiveLoader::load`] decodes everything the
/// level references; concurrent callers block until the first load finishes
/// and then share its result. A failed load leaves nothing behind, so a later
/// call tries again.
pub struct ArchiveLoader {
    base_dir: PathBuf,
    level_path: PathBuf,
    config: LoaderConfig,
    /// Contents of the level file alone
    seed: Archive,
    archive: OnceLock<Archive>,
    load_lock: Mutex<()>,
    files_read: AtomicUsize,
}

impl ArchiveLoader {
    pub fn open(base_dir: impl Into<PathBuf>, level_file: impl AsRef<Path>, config: LoaderConfig) -> Result<Self> {
        let base_dir = base_dir.into();
        let level_file = level_file.as_ref();
        let level_path = match level_file.to_str() {
            Some(relative) if level_file.is_relative() => {
                let relative = normalize(relative, &config.default_extension);
                resolve(&base_dir, &relative, config.case_insensitive_paths)
                    .unwrap_or_else(|| base_dir.join(relative))
            }
            _ => base_dir.join(level_file),
        };

        let loader = Self {
            base_dir,
            level_path,
            config,
            seed: Archive::default(),
            archive: OnceLock::new(),
            load_lock: Mutex::new(()),
            files_read: AtomicUsize::new(0),
        };
        let data = loader.read_file(&loader.level_path)?;
        let mut seed = Archive::default();
        seed.read_file(&data).map_err(|e| e.in_file(&loader.level_path))?;
        debug!(
            level = %seed.level().name,
            paths = seed.level().paths().len(),
            "opened level"
        );
        Ok(Self { seed, ..loader })
    }

    /// Level info and path table from the level file
    pub fn level(&self) -> &GameLevel {
        self.seed.level()
    }

    pub fn level_path(&self) -> &Path {
        &self.level_path
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Path table after normalization and default-path injection
    pub fn paths(&self) -> Vec<FilePath> {
        effective_paths(self.seed.level().paths(), &self.config)
    }

    /// Physical file reads so far, the level file included
    pub fn files_read(&self) -> usize {
        self.files_read.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.archive.get().is_some()
    }

    /// The fully decoded archive, loading it on first use.
    pub fn load(&self) -> Result<&Archive> {
        if let Some(archive) = self.archive.get() {
            return Ok(archive);
        }
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(archive) = self.archive.get() {
            return Ok(archive);
        }
        let archive = self.load_files()?;
        Ok(self.archive.get_or_init(|| archive))
    }

    fn load_files(&self) -> Result<Archive> {
        let paths = self.paths();
        info!(
            level = %self.level().name,
            files = paths.len(),
            "loading level archive"
        );

        // The map file goes first; everything else keeps its listed order.
        let map_index = paths.iter().position(|p| p.chunk_type == Some(ChunkType::Map));
        let ordered = map_index
            .map(|i| &paths[i])
            .into_iter()
            .chain(paths.iter().enumerate().filter(|&(i, _)| Some(i) != map_index).map(|(_, p)| p));

        let mut archive = self.seed.clone();
        let mut seen: FastSet<PathBuf> = FastSet::default();
        for entry in ordered {
            let path = resolve(&self.base_dir, &entry.path, self.config.case_insensitive_paths)
                .unwrap_or_else(|| self.base_dir.join(&entry.path));
            if !seen.insert(path.clone()) {
                debug!(path = %path.display(), "file already loaded");
                continue;
            }
            let data = self.read_file(&path)?;
            archive.read_file(&data).map_err(|e| e.in_file(&path))?;
            debug!(path = %path.display(), provides = ?entry.chunk_type, bytes = data.len(), "loaded file");
        }

        info!(
            creatures = archive.creatures().len(),
            rooms = archive.rooms().len(),
            things = archive.things().len(),
            triggers = archive.triggers().len(),
            "level archive loaded"
        );
        Ok(archive)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.is_file() {
            return Err(Error::MissingFile { path: path.to_path_buf() }.in_file(path));
        }
        self.files_read.fetch_add(1, Ordering::SeqCst);
        std::fs::read(path).map_err(|source| {
            Error::Io { path: path.to_path_buf(), source }.in_file(path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::fixture::catalog_file;
    use crate::catalog::creature::CreatureFlags;
    use crate::catalog::terrain::TerrainFlags;
    use crate::catalog::{Creature, Map, Terrain};
    use crate::codec::chunk::write_chunk;
    use crate::codec::BinaryWriter;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn write(&self, relative: &str, data: &[u8]) {
            let path = self.dir.path().join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, data).unwrap();
        }

        fn loader(&self) -> ArchiveLoader {
            ArchiveLoader::open(self.dir.path(), "Levels/Level1.kwd", LoaderConfig::default()).unwrap()
        }
    }

    fn level_file(paths: Vec<FilePath>) -> Vec<u8> {
        let level = GameLevel { name: "Level 1".into(), paths, ..Default::default() };
        let mut writer = BinaryWriter::new();
        level.write_chunk(&mut writer);
        writer.into_vec()
    }

    fn map_file() -> Vec<u8> {
        let mut map = Map::new(3, 3);
        map.tile_mut(1, 1).unwrap().terrain_id = 2;
        let mut payload = BinaryWriter::new();
        map.write(&mut payload);
        let mut writer = BinaryWriter::new();
        write_chunk(&mut writer, ChunkType::Map, map.header_fields(), payload.as_slice());
        writer.into_vec()
    }

    /// Level with terrain listed before the map, plus a globals override
    fn fixture() -> Fixture {
        let fixture = Fixture { dir: tempfile::tempdir().unwrap() };
        fixture.write(
            "Levels/Level1.kwd",
            &level_file(vec![
                FilePath::new(ChunkType::Terrain, "Data\\Editor\\Terrain"),
                FilePath::new(ChunkType::Creatures, "Data\\Editor\\Creatures"),
                FilePath::new(ChunkType::Map, "Levels\\Level1Map"),
                FilePath::new(ChunkType::Globals, "Levels\\Level1Globals"),
            ]),
        );
        fixture.write("Levels/Level1Map.kwd", &map_file());
        fixture.write(
            "Data/Editor/Terrain.kwd",
            &catalog_file(&[
                Terrain { terrain_id: 1, name: "Rock".into(), flags: TerrainFlags::SOLID, ..Default::default() },
                Terrain { terrain_id: 2, name: "Lava".into(), flags: TerrainFlags::LAVA, ..Default::default() },
            ]),
        );
        fixture.write(
            "Data/Editor/Creatures.kwd",
            &catalog_file(&[
                Creature {
                    creature_id: 1,
                    name: "Imp".into(),
                    flags: CreatureFlags::IS_WORKER | CreatureFlags::IS_EVIL,
                    ..Default::default()
                },
                Creature { creature_id: 2, name: "Troll".into(), flags: CreatureFlags::IS_EVIL, ..Default::default() },
            ]),
        );
        fixture.write(
            "Levels/Level1Globals.kwd",
            &catalog_file(&[Creature {
                creature_id: 2,
                name: "Troll Champion".into(),
                flags: CreatureFlags::IS_EVIL,
                ..Default::default()
            }]),
        );
        fixture
    }

    #[test]
    fn test_open_reads_level_only() {
        let fixture = fixture();
        let loader = fixture.loader();
        assert_eq!(loader.files_read(), 1);
        assert_eq!(loader.level().name, "Level 1");
        assert!(!loader.is_loaded());

        // Globals listed: no effect paths injected
        let paths = loader.paths();
        assert_eq!(paths.len(), 4);
        assert_eq!(paths[0].path, "Data/Editor/Terrain.kwd");
    }

    #[test]
    fn test_load_merges_all_files() {
        let fixture = fixture();
        let loader = fixture.loader();
        let archive = loader.load().unwrap();

        assert_eq!(archive.map().width(), 3);
        assert_eq!(archive.tile(1, 1).unwrap().terrain_id, 2);
        assert_eq!(archive.lava().unwrap().name, "Lava");
        assert_eq!(archive.imp().unwrap().name, "Imp");
        assert_eq!(archive.creature(2).unwrap().name, "Troll Champion");
        assert_eq!(archive.creatures().len(), 2);
        assert_eq!(loader.files_read(), 5);
    }

    #[test]
    fn test_load_is_idempotent() {
        let fixture = fixture();
        let loader = fixture.loader();
        let first = loader.load().unwrap() as *const Archive;
        let second = loader.load().unwrap() as *const Archive;
        assert_eq!(first, second);
        assert_eq!(loader.files_read(), 5);
    }

    #[test]
    fn test_concurrent_load_reads_once() {
        let fixture = fixture();
        let loader = fixture.loader();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| loader.load().map(|a| a.creatures().len())))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), 2);
            }
        });
        assert_eq!(loader.files_read(), 5);
    }

    #[test]
    fn test_missing_file_names_path_and_retries() {
        let fixture = fixture();
        std::fs::remove_file(fixture.dir.path().join("Data/Editor/Creatures.kwd")).unwrap();
        let loader = fixture.loader();

        match loader.load() {
            Err(Error::File { path, source }) => {
                assert!(path.ends_with("Data/Editor/Creatures.kwd"));
                assert!(matches!(*source, Error::MissingFile { .. }));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(!loader.is_loaded());

        fixture.write("Data/Editor/Creatures.kwd", &catalog_file::<Creature>(&[]));
        let archive = loader.load().unwrap();
        assert_eq!(archive.creature(2).unwrap().name, "Troll Champion");
    }

    #[test]
    fn test_corrupt_file_is_attributed() {
        let fixture = fixture();
        fixture.write("Data/Editor/Terrain.kwd", &[1, 2, 3]);
        let loader = fixture.loader();
        match loader.load() {
            Err(Error::File { path, .. }) => assert!(path.ends_with("Data/Editor/Terrain.kwd")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_default_paths_injected_without_globals() {
        let fixture = Fixture { dir: tempfile::tempdir().unwrap() };
        fixture.write(
            "Levels/Level1.kwd",
            &level_file(vec![FilePath::new(ChunkType::Map, "Levels\\Level1Map")]),
        );
        fixture.write("Levels/Level1Map.kwd", &map_file());
        fixture.write("Data/editor/Effects.kwd", &catalog_file::<crate::catalog::Effect>(&[]));
        fixture.write("Data/editor/EffectElements.kwd", &catalog_file::<crate::catalog::EffectElement>(&[]));

        let loader = fixture.loader();
        assert_eq!(loader.paths().len(), 3);
        loader.load().unwrap();
        assert_eq!(loader.files_read(), 4);
    }
}
