use std::path::PathBuf;

use rand::Rng;
use rand::distr::Alphanumeric;

fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
}

/// A path in the temp directory which does not exist yet.
pub fn temp_file() -> PathBuf {
    std::env::temp_dir().join(random_string(16))
}

/// Write `content` to a fresh temp file and return its path.
pub fn write_temp_file(content: &str) -> PathBuf {
    let path = temp_file();
    std::fs::write(&path, content).expect("write temp file");
    path
}
