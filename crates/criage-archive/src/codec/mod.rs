//! Pluggable archive codecs

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use criage_core::error::CriageError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::format::ArchiveFormat;
use crate::tarball::{unpack_tree, write_tree};
use crate::ArchiveResult;

/// Packs a directory into an archive stream and back
pub trait ArchiveCodec: Send + Sync {
    fn format(&self) -> ArchiveFormat;

    /// Write the contents of `source_dir` to `writer`
    fn pack(&self, source_dir: &Path, writer: &mut dyn Write, level: i32) -> ArchiveResult<()>;

    /// Extract the stream into `dest_dir`, which is created if missing
    fn unpack(&self, reader: &mut dyn Read, dest_dir: &Path) -> ArchiveResult<()>;

    /// Pack into a new file at `archive`
    fn pack_file(&self, source_dir: &Path, archive: &Path, level: i32) -> ArchiveResult<()> {
        let file = File::create(archive)
            .map_err(|e| CriageError::io(format!("Failed to create {}", archive.display()), e))?;
        let mut writer = BufWriter::new(file);
        self.pack(source_dir, &mut writer, level)?;
        writer
            .flush()
            .map_err(|e| CriageError::io(format!("Failed to write {}", archive.display()), e))
    }

    fn unpack_file(&self, archive: &Path, dest_dir: &Path) -> ArchiveResult<()> {
        let file = File::open(archive)
            .map_err(|e| CriageError::io(format!("Failed to open {}", archive.display()), e))?;
        self.unpack(&mut BufReader::new(file), dest_dir)
    }
}

/// gzip-compressed tar
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzCodec;

impl ArchiveCodec for TarGzCodec {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::TarGz
    }

    fn pack(&self, source_dir: &Path, writer: &mut dyn Write, level: i32) -> ArchiveResult<()> {
        let level = level.clamp(0, 9) as u32;
        let encoder = GzEncoder::new(writer, Compression::new(level));
        write_tree(encoder, source_dir)?
            .finish()
            .map_err(|e| CriageError::io("Failed to finish gzip stream", e))?;
        Ok(())
    }

    fn unpack(&self, reader: &mut dyn Read, dest_dir: &Path) -> ArchiveResult<()> {
        let entries = unpack_tree(GzDecoder::new(reader), dest_dir)?;
        tracing::debug!(entries, dest = %dest_dir.display(), "unpacked tar.gz");
        Ok(())
    }
}

/// zstd-compressed tar
#[derive(Debug, Clone, Copy, Default)]
pub struct TarZstCodec;

impl ArchiveCodec for TarZstCodec {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::TarZst
    }

    fn pack(&self, source_dir: &Path, writer: &mut dyn Write, level: i32) -> ArchiveResult<()> {
        let level = level.clamp(1, 22);
        let encoder = zstd::stream::write::Encoder::new(writer, level)
            .map_err(|e| CriageError::io("Failed to start zstd stream", e))?;
        write_tree(encoder, source_dir)?
            .finish()
            .map_err(|e| CriageError::io("Failed to finish zstd stream", e))?;
        Ok(())
    }

    fn unpack(&self, reader: &mut dyn Read, dest_dir: &Path) -> ArchiveResult<()> {
        let decoder = zstd::stream::read::Decoder::new(reader)
            .map_err(|e| CriageError::archive(format!("Invalid zstd stream: {}", e)))?;
        let entries = unpack_tree(decoder, dest_dir)?;
        tracing::debug!(entries, dest = %dest_dir.display(), "unpacked tar.zst");
        Ok(())
    }
}

/// Codecs available to the manager, one per format
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: BTreeMap<ArchiveFormat, Arc<dyn ArchiveCodec>>,
}

impl CodecRegistry {
    /// A registry without any codec
    pub fn empty() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// Add or replace the codec for its format
    pub fn register(&mut self, codec: Arc<dyn ArchiveCodec>) {
        self.codecs.insert(codec.format(), codec);
    }

    pub fn get(&self, format: ArchiveFormat) -> ArchiveResult<Arc<dyn ArchiveCodec>> {
        self.codecs
            .get(&format)
            .cloned()
            .ok_or_else(|| CriageError::archive(format!("no codec registered for {}", format)))
    }

    pub fn formats(&self) -> impl Iterator<Item = ArchiveFormat> + '_ {
        self.codecs.keys().copied()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(TarGzCodec));
        registry.register(Arc::new(TarZstCodec));
        registry
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.codecs.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("criage.json"), r#"{"name": "demo"}"#).unwrap();
        fs::write(root.join("src").join("lib.txt"), "library").unwrap();
    }

    #[test]
    fn test_codecs_restore_tree() {
        for codec in [
            Arc::new(TarGzCodec) as Arc<dyn ArchiveCodec>,
            Arc::new(TarZstCodec),
        ] {
            let temp_dir = tempdir().unwrap();
            let source = temp_dir.path().join("source");
            let dest = temp_dir.path().join("dest");
            sample_tree(&source);

            let archive = temp_dir.path().join(format!("demo.{}", codec.format()));
            codec.pack_file(&source, &archive, 3).unwrap();
            codec.unpack_file(&archive, &dest).unwrap();

            assert_eq!(
                fs::read_to_string(dest.join("src").join("lib.txt")).unwrap(),
                "library"
            );
            assert!(dest.join("criage.json").is_file());
        }
    }

    #[test]
    fn test_wrong_codec_fails_cleanly() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source");
        sample_tree(&source);

        let mut bytes = Vec::new();
        TarGzCodec.pack(&source, &mut bytes, 6).unwrap();

        let result = TarZstCodec.unpack(&mut &bytes[..], &temp_dir.path().join("dest"));
        assert!(result.is_err());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = CodecRegistry::default();
        assert_eq!(
            registry.formats().collect::<Vec<_>>(),
            vec![ArchiveFormat::TarGz, ArchiveFormat::TarZst]
        );
        assert_eq!(
            registry.get(ArchiveFormat::TarZst).unwrap().format(),
            ArchiveFormat::TarZst
        );

        let empty = CodecRegistry::empty();
        assert!(matches!(
            empty.get(ArchiveFormat::TarGz),
            Err(CriageError::Archive { .. })
        ));
    }

    fn file_structure_strategy() -> impl Strategy<Value = HashMap<String, Vec<u8>>> {
        prop::collection::hash_map(
            "[a-z0-9_-]{1,8}(/[a-z0-9_-]{1,8}){0,2}\\.[a-z]{1,3}",
            prop::collection::vec(any::<u8>(), 0..512),
            1..8,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]
        #[test]
        fn prop_unpack_restores_file_contents(files in file_structure_strategy()) {
            let temp_dir = tempdir().unwrap();
            let source = temp_dir.path().join("source");
            let dest = temp_dir.path().join("dest");

            let mut written = HashMap::new();
            for (path, content) in &files {
                let full = source.join(path);
                // A generated file path may collide with a generated directory
                if fs::create_dir_all(full.parent().unwrap()).is_err() || full.is_dir() {
                    continue;
                }
                if fs::write(&full, content).is_ok() {
                    written.insert(path.clone(), content.clone());
                }
            }
            fs::create_dir_all(&source).unwrap();

            let mut bytes = Vec::new();
            TarZstCodec.pack(&source, &mut bytes, 3).unwrap();
            TarZstCodec.unpack(&mut &bytes[..], &dest).unwrap();

            for (path, content) in written {
                prop_assert_eq!(fs::read(dest.join(&path)).unwrap(), content);
            }
        }
    }
}
