//! Synthetic read/write request stream, 3:1 read-heavy.

pub const FILES: [&str; 4] = ["file1", "file2", "file3", "file4"];

#[derive(Debug, Clone)]
pub enum Op {
    /// Read the whole file.
    Read { file: &'static str },
    /// Append-free single-byte overwrite at the start of the file.
    Write { file: &'static str, byte: u8 },
}

/// xorshift64; good enough for shuffling a workload, and the
/// workspace carries no rand dependency.
pub struct XorShift64(u64);

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

pub fn generate(requests: usize, seed: u64) -> Vec<Op> {
    let mut rng = XorShift64::new(seed);

    (0..requests)
        .map(|_| {
            let file = FILES[(rng.next() % FILES.len() as u64) as usize];
            if rng.next() % 4 < 3 {
                Op::Read { file }
            } else {
                Op::Write {
                    file,
                    byte: b'A' + (rng.next() % 26) as u8,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generate, Op};

    #[test]
    fn workload_is_deterministic_per_seed() {
        let a = generate(50, 42);
        let b = generate(50, 42);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            match (x, y) {
                (Op::Read { file: f }, Op::Read { file: g }) => assert_eq!(f, g),
                (Op::Write { file: f, byte: p }, Op::Write { file: g, byte: q }) => {
                    assert_eq!((f, p), (g, q))
                }
                _ => panic!("streams diverged"),
            }
        }
    }

    #[test]
    fn reads_dominate() {
        let ops = generate(1000, 7);
        let reads = ops.iter().filter(|op| matches!(op, Op::Read { .. })).count();
        assert!(reads > 600, "only {reads} reads of 1000");
    }
}
