use crate::*;
use content_inspector::ContentType;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A ledger store
///
/// [`Election`] calls `save` after every committed mutation and `load` when it opens, or
/// when it needs to roll memory back to the last durable state after a failed save.
pub trait Store: Send + Sync {
    /// Get the last saved ledger, if any
    fn load(&self) -> Result<Option<Ledger>, Error>;

    /// Durably replace the saved ledger
    fn save(&self, ledger: &Ledger) -> Result<(), Error>;
}

/// A store that keeps nothing
///
/// The ledger lives only in the memory of the [`Election`] that owns it.
#[derive(Default, Clone, Copy, Debug)]
pub struct MemStore;

impl Store for MemStore {
    fn load(&self) -> Result<Option<Ledger>, Error> {
        Ok(None)
    }

    fn save(&self, _ledger: &Ledger) -> Result<(), Error> {
        Ok(())
    }
}

/// Serialization format of a [`FileStore`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    JSON,
    CBOR,
}

/// A store that snapshots the ledger into a single file
///
/// Writes go to a temporary sibling file that is then renamed over the ledger, so a
/// crash mid-write leaves the previous snapshot intact. The temporary file is synced to
/// disk before the rename. Paths ending in `.json` are written as pretty JSON, everything
/// else as CBOR. Either format is accepted on load.
///
/// Every save rewrites the whole ledger, journal included. The journal only grows, so
/// the cost of each write grows with the history of the election.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    format: Format,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::JSON,
            _ => Format::CBOR,
        };
        FileStore { path, format }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

/// Unpack a ledger from bytes, sniffing the format
pub fn ledger_from_bytes(bytes: &[u8]) -> Result<Ledger, Error> {
    // If it starts with `{` then it's JSON. A CBOR ledger is a map and never does.
    if bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') {
        return Ok(serde_json::from_slice(bytes)?);
    }

    // CBOR without any NUL byte inspects as UTF-8, so only wide encodings are rejected
    match content_inspector::inspect(bytes) {
        ContentType::BINARY | ContentType::UTF_8 => Ok(serde_cbor::from_slice(bytes)?),
        _ => Err(Error::UnknownFormat),
    }
}

impl Store for FileStore {
    fn load(&self) -> Result<Option<Ledger>, Error> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        ledger_from_bytes(&bytes).map(Some)
    }

    fn save(&self, ledger: &Ledger) -> Result<(), Error> {
        let bytes = match self.format {
            Format::JSON => serde_json::to_vec_pretty(ledger)?,
            Format::CBOR => serde_cbor::to_vec(ledger)?,
        };

        let tmp = self.temp_path();
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn file_store_format_from_extension() {
        assert_eq!(FileStore::new("ledger.json").format(), Format::JSON);
        assert_eq!(FileStore::new("ledger.JSON").format(), Format::JSON);
        assert_eq!(FileStore::new("ledger.db").format(), Format::CBOR);
        assert_eq!(
            FileStore::new("ledger").with_format(Format::JSON).format(),
            Format::JSON
        );
        assert_eq!(
            FileStore::new("/tmp/ledger.db").temp_path(),
            PathBuf::from("/tmp/ledger.db.tmp")
        );
    }

    #[test]
    fn mem_store_keeps_nothing() {
        let ledger = Ledger::new("owner-secret", Limits::default()).unwrap();
        MemStore.save(&ledger).unwrap();
        assert!(MemStore.load().unwrap().is_none());
    }

    #[test]
    fn ledger_bytes_in_both_formats() {
        let ledger = Ledger::new("owner-secret", Limits::default()).unwrap();

        let json = serde_json::to_vec(&ledger).unwrap();
        let cbor = serde_cbor::to_vec(&ledger).unwrap();
        assert!(ledger_from_bytes(&json).unwrap().verify_owner("owner-secret"));
        assert!(ledger_from_bytes(&cbor).unwrap().verify_owner("owner-secret"));
    }
}
