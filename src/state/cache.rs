//! Bounded snapshot cache with optional binary persistence.
//!
//! File layout: magic `QSSC`, version `u32`, then per entry
//! `(label_len u32, label bytes, num_qubits u32, 2^n × (f64 real, f64 imag))`,
//! all little-endian, entries until end of file.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::path::Path;

use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::types::MAX_QUBITS;

const MAGIC: &[u8; 4] = b"QSSC";
const VERSION: u32 = 1;

/// Label-keyed snapshots of state-vector amplitudes, bounded by a capacity;
/// inserting past it evicts the oldest label.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    capacity: usize,
    entries: VecDeque<(String, Vec<Complex64>)>,
}

impl SnapshotCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// Stores a snapshot. An existing label is overwritten and counts as a
    /// fresh insertion for eviction order.
    pub fn save(&mut self, label: impl Into<String>, amplitudes: Vec<Complex64>) {
        let label = label.into();
        self.entries.retain(|(existing, _)| *existing != label);
        self.entries.push_back((label, amplitudes));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn load(&self, label: &str) -> Result<&Vec<Complex64>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, amps)| amps)
            .ok_or_else(|| Error::SnapshotMissing(label.to_string()))
    }

    pub fn remove(&mut self, label: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != label);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serialises every entry, oldest first.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(MAGIC)?;
        out.write_all(&VERSION.to_le_bytes())?;
        for (label, amps) in &self.entries {
            out.write_all(&(label.len() as u32).to_le_bytes())?;
            out.write_all(label.as_bytes())?;
            let num_qubits = amps.len().trailing_zeros();
            out.write_all(&num_qubits.to_le_bytes())?;
            for amp in amps {
                out.write_all(&amp.re.to_le_bytes())?;
                out.write_all(&amp.im.to_le_bytes())?;
            }
        }
        Ok(())
    }

    /// Reads a cache written by [`SnapshotCache::write_to`], applying the
    /// given capacity bound (oldest entries evict first, as on insertion).
    pub fn read_from<R: Read>(mut input: R, capacity: usize) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::SnapshotFormat("bad magic".to_string()));
        }
        let version = read_u32(&mut input)?;
        if version != VERSION {
            return Err(Error::SnapshotFormat(format!(
                "unsupported version {}",
                version
            )));
        }

        let mut cache = SnapshotCache::new(capacity);
        loop {
            let mut len_buf = [0u8; 4];
            match input.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let label_len = u32::from_le_bytes(len_buf) as usize;
            let mut label_bytes = vec![0u8; label_len];
            input.read_exact(&mut label_bytes)?;
            let label = String::from_utf8(label_bytes)
                .map_err(|_| Error::SnapshotFormat("label is not UTF-8".to_string()))?;

            let num_qubits = read_u32(&mut input)? as usize;
            if num_qubits == 0 || num_qubits > MAX_QUBITS {
                return Err(Error::SnapshotFormat(format!(
                    "entry '{}' claims {} qubits",
                    label, num_qubits
                )));
            }
            let mut amps = Vec::with_capacity(1 << num_qubits);
            let mut f64_buf = [0u8; 8];
            for _ in 0..1usize << num_qubits {
                input.read_exact(&mut f64_buf)?;
                let re = f64::from_le_bytes(f64_buf);
                input.read_exact(&mut f64_buf)?;
                let im = f64::from_le_bytes(f64_buf);
                amps.push(Complex64::new(re, im));
            }
            cache.save(label, amps);
        }
        Ok(cache)
    }

    /// Convenience wrapper writing to a file path.
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }

    /// Convenience wrapper reading from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_from(std::io::BufReader::new(file), capacity)
    }
}

fn read_u32<R: Read>(input: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amps(bits: usize, tag: f64) -> Vec<Complex64> {
        let mut v = vec![Complex64::new(0.0, 0.0); 1 << bits];
        v[0] = Complex64::new(tag, 0.0);
        v
    }

    #[test]
    fn oldest_entry_evicts_first() {
        let mut cache = SnapshotCache::new(2);
        cache.save("a", amps(1, 1.0));
        cache.save("b", amps(1, 2.0));
        cache.save("c", amps(1, 3.0));
        assert_eq!(cache.len(), 2);
        assert!(cache.load("a").is_err());
        assert!(cache.load("b").is_ok());
        assert!(cache.load("c").is_ok());
    }

    #[test]
    fn resaving_a_label_refreshes_its_age() {
        let mut cache = SnapshotCache::new(2);
        cache.save("a", amps(1, 1.0));
        cache.save("b", amps(1, 2.0));
        cache.save("a", amps(1, 9.0));
        cache.save("c", amps(1, 3.0));
        // "b" was oldest after "a" was refreshed.
        assert!(cache.load("b").is_err());
        assert_eq!(cache.load("a").unwrap()[0].re, 9.0);
    }

    #[test]
    fn binary_round_trip_preserves_entries() {
        let mut cache = SnapshotCache::new(4);
        cache.save("ground", amps(2, 1.0));
        cache.save("excited", amps(3, 0.5));

        let mut buffer = Vec::new();
        cache.write_to(&mut buffer).unwrap();
        let restored = SnapshotCache::read_from(buffer.as_slice(), 4).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.load("ground").unwrap(), cache.load("ground").unwrap());
        assert_eq!(restored.load("excited").unwrap(), cache.load("excited").unwrap());
        assert_eq!(restored.labels().collect::<Vec<_>>(), vec!["ground", "excited"]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = b"NOPE\x01\x00\x00\x00";
        assert!(matches!(
            SnapshotCache::read_from(&bytes[..], 4),
            Err(Error::SnapshotFormat(_))
        ));
    }

    #[test]
    fn missing_labels_report_cleanly() {
        let cache = SnapshotCache::new(2);
        assert!(matches!(
            cache.load("nowhere"),
            Err(Error::SnapshotMissing(_))
        ));
    }
}
