//! Source tests: files, readers and user-defined sources.

use rivulet::prelude::*;
use rivulet::source::{BoxSource, LineSource};
use std::io::{Cursor, Write};
use std::sync::Arc;

/// Multiples of `step` in `[lo, hi)`, splittable by index.
struct Multiples {
    step: u64,
    lo: u64,
    hi: u64,
}

impl Source for Multiples {
    type Item = u64;

    fn produce(&mut self) -> rivulet::Result<Option<u64>> {
        if self.lo >= self.hi {
            return Ok(None);
        }
        let value = self.lo * self.step;
        self.lo += 1;
        Ok(Some(value))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Exact((self.hi - self.lo) as usize)
    }

    fn split_off(&mut self, parts: usize) -> Vec<BoxSource<u64>> {
        let len = self.hi - self.lo;
        let parts = parts.max(1) as u64;
        let bounds: Vec<u64> = (0..=parts).map(|p| self.lo + p * len / parts).collect();
        let rest = bounds
            .windows(2)
            .skip(1)
            .map(|w| {
                Box::new(Multiples {
                    step: self.step,
                    lo: w[0],
                    hi: w[1],
                }) as BoxSource<u64>
            })
            .collect();
        self.hi = bounds[1];
        rest
    }
}

/// Test a user-defined source under both strategies.
#[test]
fn test_custom_source() {
    let seq = Pipeline::new(Multiples { step: 3, lo: 0, hi: 100 }).to_vec().unwrap();
    assert_eq!(seq.len(), 100);
    assert_eq!(seq[99], 297);

    let par = Pipeline::new(Multiples { step: 3, lo: 0, hi: 100 })
        .parallel_with(Arc::new(rivulet::execution::InlinePool::new(6)))
        .to_vec()
        .unwrap();
    assert_eq!(par, seq);

    let threaded = Pipeline::new(Multiples { step: 3, lo: 0, hi: 100 })
        .parallel_with(Arc::new(ThreadPool::with_workers(4)))
        .map_to_numeric(|n| n)
        .sum()
        .unwrap();
    assert_eq!(threaded, 3 * 4950);
}

/// Test reading a file with mixed line endings.
#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "alpha\r\nbeta\n\nalphabet\ngamma").unwrap();
    file.flush().unwrap();

    let lines = rivulet::from_file(file.path()).to_vec().unwrap();
    assert_eq!(lines, vec!["alpha", "beta", "", "alphabet", "gamma"]);

    let alphas = rivulet::from_file(file.path())
        .filter(|l| l.starts_with("alpha"))
        .count()
        .unwrap();
    assert_eq!(alphas, 2);
}

/// Test that a missing file fails the terminal operation, not the builder.
#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = rivulet::from_file(dir.path().join("absent.txt")).map(|l| l.len());
    let err = p.count().unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().starts_with("I/O error"));
}

/// Test reading lines from an in-memory reader.
#[test]
fn test_from_reader() {
    let reader = Cursor::new(b"3\n1\n4\n1\n5\n9\n".to_vec());
    let digits: Vec<u32> = rivulet::from_reader(reader)
        .try_map(|l| l.parse::<u32>())
        .distinct()
        .sorted()
        .collect()
        .unwrap();
    assert_eq!(digits, vec![1, 3, 4, 5, 9]);

    let mut source = LineSource::from_reader(Cursor::new("x\ny"));
    assert_eq!(source.size_hint(), SizeHint::Unknown);
    assert_eq!(source.produce().unwrap().as_deref(), Some("x"));
    assert_eq!(source.lines_read(), 1);
}

/// Test empty, iterator and slice sources.
#[test]
fn test_basic_sources() {
    assert_eq!(rivulet::empty::<u8>().count().unwrap(), 0);
    assert_eq!(rivulet::empty::<u8>().find_first().unwrap(), None);

    let chars = rivulet::from_iter("hello".chars()).distinct().collect::<String>().unwrap();
    assert_eq!(chars, "helo");

    let data = [5, 3, 8];
    let doubled = rivulet::from_slice(&data).map(|n| n * 2).to_vec().unwrap();
    assert_eq!(doubled, vec![10, 6, 16]);
    assert_eq!(data, [5, 3, 8]);
}

/// Test iterate and generate with short-circuiting terminals.
#[test]
fn test_infinite_sources() {
    let powers = rivulet::iterate(1u64, |n| n * 2).limit(10).to_vec().unwrap();
    assert_eq!(powers.last(), Some(&512));

    let big = rivulet::iterate(1u64, |n| n * 3).filter(|n| *n > 1000).find_first().unwrap();
    assert_eq!(big, Some(2187));

    let mut next = 0;
    let ones = rivulet::generate(move || {
        next += 1;
        next % 2
    })
    .limit(6)
    .filter(|n| *n == 1)
    .count()
    .unwrap();
    assert_eq!(ones, 3);
}

/// Test that an endless iterator is treated like any other infinite source.
#[test]
fn test_endless_iterator_source() {
    let p = rivulet::from_iter(0u64..);
    assert!(matches!(p.count(), Err(Error::Unbounded { operation: "count" })));

    let p = rivulet::from_iter(std::iter::repeat("tick"));
    assert!(matches!(p.sorted().to_vec(), Err(Error::Unbounded { operation: "sorted" })));

    let head = rivulet::from_iter((0u64..).map(|n| n * n)).limit(4).to_vec().unwrap();
    assert_eq!(head, vec![0, 1, 4, 9]);
    assert!(rivulet::from_iter(0u64..).any_match(|n| *n == 1_000).unwrap());

    // A bounded adaptor over an endless iterator stays finite.
    assert_eq!(rivulet::from_iter((0u64..).take(3)).count().unwrap(), 3);
}
