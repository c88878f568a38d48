use std::collections::{HashMap, HashSet};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Dumpable state of a finished crawl: page texts (body text plus
/// accumulated anchor text) and the link graph.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CrawlSnapshot {
    pub contents: HashMap<String, String>,
    pub references: HashMap<String, HashSet<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_contents: usize,
    pub num_references: usize,
    pub created_at: String,
    pub version: u32,
}

pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn contents(&self) -> PathBuf {
        self.root.join("contents.bin")
    }

    fn references(&self) -> PathBuf {
        self.root.join("references.bin")
    }

    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

pub fn save_contents(paths: &ArtifactPaths, contents: &HashMap<String, String>) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.contents())?;
    f.write_all(&bincode::serialize(contents)?)?;
    Ok(())
}

pub fn load_contents(paths: &ArtifactPaths) -> Result<HashMap<String, String>> {
    let mut f = File::open(paths.contents())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_references(
    paths: &ArtifactPaths,
    references: &HashMap<String, HashSet<String>>,
) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.references())?;
    f.write_all(&bincode::serialize(references)?)?;
    Ok(())
}

pub fn load_references(paths: &ArtifactPaths) -> Result<HashMap<String, HashSet<String>>> {
    let mut f = File::open(paths.references())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_meta(paths: &ArtifactPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    f.write_all(serde_json::to_string_pretty(meta)?.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &ArtifactPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// Dump the whole snapshot plus its meta file.
pub fn save_snapshot(paths: &ArtifactPaths, snapshot: &CrawlSnapshot, created_at: &str) -> Result<()> {
    save_contents(paths, &snapshot.contents)?;
    save_references(paths, &snapshot.references)?;
    save_meta(
        paths,
        &MetaFile {
            num_contents: snapshot.contents.len(),
            num_references: snapshot.references.len(),
            created_at: created_at.to_string(),
            version: 1,
        },
    )
}

/// Reconstitute a snapshot dumped by `save_snapshot`.
pub fn load_snapshot(paths: &ArtifactPaths) -> Result<CrawlSnapshot> {
    Ok(CrawlSnapshot {
        contents: load_contents(paths)?,
        references: load_references(paths)?,
    })
}
