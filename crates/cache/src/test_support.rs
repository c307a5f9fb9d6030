//! Builders for in-memory snapshot archives.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use {
    flate2::{Compression, write::GzEncoder},
    tar::{EntryType, Header},
};

pub(crate) struct SnapshotEntry {
    name: String,
    kind: EntryType,
    data: Vec<u8>,
    link: Option<String>,
}

impl SnapshotEntry {
    pub(crate) fn file(name: &str, data: &str) -> Self {
        Self {
            name: name.into(),
            kind: EntryType::Regular,
            data: data.as_bytes().to_vec(),
            link: None,
        }
    }

    pub(crate) fn dir(name: &str) -> Self {
        Self {
            name: name.into(),
            kind: EntryType::Directory,
            data: Vec::new(),
            link: None,
        }
    }

    pub(crate) fn symlink(name: &str, target: &str) -> Self {
        Self {
            name: name.into(),
            kind: EntryType::Symlink,
            data: Vec::new(),
            link: Some(target.into()),
        }
    }
}

/// Gzip'd tar bytes. Names are written into the header verbatim, so tests
/// can produce entries a well-behaved archiver would refuse.
pub(crate) fn snapshot(entries: &[SnapshotEntry]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for entry in entries {
        let mut header = Header::new_old();
        let name = entry.name.as_bytes();
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        if let Some(link) = &entry.link {
            let link = link.as_bytes();
            header.as_old_mut().linkname[..link.len()].copy_from_slice(link);
        }
        header.set_entry_type(entry.kind);
        header.set_size(entry.data.len() as u64);
        header.set_mode(if entry.kind == EntryType::Directory {
            0o755
        } else {
            0o644
        });
        header.set_mtime(0);
        header.set_cksum();
        builder.append(&header, entry.data.as_slice()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Snapshot whose files carry `marker` so tests can tell revisions apart.
pub(crate) fn plugin_snapshot(marker: &str) -> Vec<u8> {
    snapshot(&[
        SnapshotEntry::dir("acme-generator-ui5-app-root/"),
        SnapshotEntry::file("acme-generator-ui5-app-root/package.json", "{}"),
        SnapshotEntry::file("acme-generator-ui5-app-root/VERSION", marker),
    ])
}
