//! Test doubles shared by unit tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::application::ports::MockFilesystem;
use crate::error::SpliceError;

pub type Files = Arc<Mutex<BTreeMap<PathBuf, String>>>;

/// A `MockFilesystem` backed by a shared map; directories are implied by
/// the paths of the files below them.
pub fn memory_fs(initial: &[(&str, &str)]) -> (MockFilesystem, Files) {
    let files: Files = Arc::new(Mutex::new(
        initial
            .iter()
            .map(|(p, c)| (PathBuf::from(p), c.to_string()))
            .collect(),
    ));

    fn is_dir(files: &BTreeMap<PathBuf, String>, p: &Path) -> bool {
        files.keys().any(|f| f.starts_with(p) && f != p)
    }

    let mut fs = MockFilesystem::new();
    let f = files.clone();
    fs.expect_exists().returning(move |p| {
        let files = f.lock().unwrap();
        files.contains_key(p) || is_dir(&files, p)
    });
    let f = files.clone();
    fs.expect_is_dir()
        .returning(move |p| is_dir(&f.lock().unwrap(), p));
    let f = files.clone();
    fs.expect_read_to_string().returning(move |p| {
        f.lock()
            .unwrap()
            .get(p)
            .cloned()
            .ok_or_else(|| SpliceError::Io {
                path: p.to_path_buf(),
                reason: "No such file or directory".into(),
            })
    });
    let f = files.clone();
    fs.expect_write_file().returning(move |p, content| {
        f.lock().unwrap().insert(p.to_path_buf(), content.to_string());
        Ok(())
    });
    fs.expect_create_dir_all().returning(|_| Ok(()));
    let f = files.clone();
    fs.expect_list_dir().returning(move |p| {
        let files = f.lock().unwrap();
        let mut children: Vec<PathBuf> = files
            .keys()
            .filter_map(|k| k.strip_prefix(p).ok()?.components().next().map(|c| p.join(c)))
            .collect();
        children.sort();
        children.dedup();
        Ok(children)
    });
    (fs, files)
}

pub fn read(files: &Files, path: &str) -> Option<String> {
    files.lock().unwrap().get(Path::new(path)).cloned()
}
