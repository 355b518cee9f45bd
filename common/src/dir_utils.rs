//   Copyright 2024. The Tari Project
//
//   Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
//   following conditions are met:
//
//   1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
//   disclaimer.
//
//   2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
//   following disclaimer in the documentation and/or other materials provided with the distribution.
//
//   3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
//   products derived from this software without specific prior written permission.
//
//   THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
//   INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//   DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
//   SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
//   SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
//   WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
//   USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::{
    env,
    io,
    path::{Path, PathBuf},
};

/// The default root for session directories, `$TMPDIR/chatsim`.
pub fn default_base_path() -> PathBuf {
    env::temp_dir().join("chatsim")
}

/// Returns `<base_path>/<session_id>`, creating it if it doesn't already exist.
pub fn create_session_directory<P: AsRef<Path>>(base_path: P, session_id: &str) -> Result<PathBuf, io::Error> {
    if session_id.is_empty() || session_id.contains(|c: char| c == '/' || c == '\\') || session_id == ".." {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{}` cannot be used as a session directory name", session_id),
        ));
    }
    let path = base_path.as_ref().join(session_id);
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_creates_nested_session_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_session_directory(dir.path().join("runs"), "application-1").unwrap();
        assert!(path.is_dir());
        assert!(path.ends_with("runs/application-1"));
        // a second call is a no-op
        create_session_directory(dir.path().join("runs"), "application-1").unwrap();
    }

    #[test]
    fn it_rejects_path_like_session_ids() {
        let dir = tempfile::tempdir().unwrap();
        assert!(create_session_directory(dir.path(), "").is_err());
        assert!(create_session_directory(dir.path(), "../escape").is_err());
        assert!(create_session_directory(dir.path(), "..").is_err());
    }
}
