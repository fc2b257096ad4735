//! Numeric pipeline tests.

use rivulet::collector::{summarizing, summing};
use rivulet::numeric::Summary;
use rivulet::{Error, NumericPipeline, Pipeline};

/// Test range sums over integer widths.
#[test]
fn test_range_sums() {
    assert_eq!(rivulet::range(1u32, 101).sum().unwrap(), 5050);
    assert_eq!(rivulet::range_closed(-5i64, 5).sum().unwrap(), 0);
    assert_eq!(rivulet::range(10usize, 10).count().unwrap(), 0);
    assert_eq!(rivulet::range_closed(7u8, 7).to_vec().unwrap(), vec![7]);
}

/// Test that empty pipelines have no min, max or average.
#[test]
fn test_empty_statistics() {
    assert_eq!(NumericPipeline::<i32>::empty().max().unwrap(), None);
    assert_eq!(NumericPipeline::<f32>::empty().min().unwrap(), None);
    assert_eq!(NumericPipeline::<u64>::empty().average().unwrap(), None);

    let summary = NumericPipeline::<i32>::empty().summary().unwrap();
    assert_eq!(summary.count(), 0);
    assert_eq!(summary.sum(), 0);
    assert_eq!(summary.to_string(), "count=0, sum=0");
}

/// Test the one-pass summary.
#[test]
fn test_summary() {
    let summary = NumericPipeline::of(vec![3i32, 2, 2, 3, 7, 3, 5]).summary().unwrap();
    assert_eq!(summary.count(), 7);
    assert_eq!(summary.sum(), 25);
    assert_eq!(summary.min(), Some(2));
    assert_eq!(summary.max(), Some(7));
    let avg = summary.average().unwrap();
    assert!((avg - 25.0 / 7.0).abs() < 1e-12);
}

/// Test that a parallel summary equals the sequential one.
#[test]
fn test_summary_parallel() {
    let seq = NumericPipeline::range(-500i64, 500).summary().unwrap();
    let par = NumericPipeline::range(-500i64, 500).parallel().summary().unwrap();
    assert_eq!(seq.count(), par.count());
    assert_eq!(seq.sum(), par.sum());
    assert_eq!(seq.min(), par.min());
    assert_eq!(seq.max(), par.max());
    assert_eq!(par.to_string(), seq.to_string());

    let mut merged = Summary::new();
    merged.accept(1.5f64);
    let mut other = Summary::new();
    other.accept(-2.0);
    other.accept(4.0);
    let merged = merged.combine(other);
    assert_eq!(merged.count(), 3);
    assert_eq!(merged.min(), Some(-2.0));
    assert_eq!(merged.sum(), 3.5);
}

/// Test mapping objects to numbers and back.
#[test]
fn test_map_to_numeric() {
    let words = Pipeline::of(vec!["abc", "", "bc", "efg", "abcd", "", "jkl"]);
    let total = words.map_to_numeric(|w| w.len() as u32).sum().unwrap();
    assert_eq!(total, 15);

    let squares = NumericPipeline::of(vec![3i32, 2, 2, 3, 7, 3, 5])
        .map(|n| n * n)
        .distinct()
        .to_vec()
        .unwrap();
    assert_eq!(squares, vec![9, 4, 49, 25]);

    let labels = NumericPipeline::range(1i32, 4)
        .map_to_obj(|n| n.to_string())
        .collect_with(rivulet::collector::joining("-"))
        .unwrap();
    assert_eq!(labels, "1-2-3");
}

/// Test float ordering and averaging.
#[test]
fn test_float_pipelines() {
    let values = vec![1.5f64, -0.5, f64::NAN, 4.0];
    let sorted = NumericPipeline::of(values.clone()).sorted().to_vec().unwrap();
    assert_eq!(&sorted[..3], &[-0.5, 1.5, 4.0]);
    assert!(sorted[3].is_nan());

    assert_eq!(NumericPipeline::of(values.clone()).max().unwrap().map(f64::is_nan), Some(true));
    assert_eq!(NumericPipeline::of(values).min().unwrap(), Some(-0.5));

    let avg = NumericPipeline::of(vec![1.0f32, 2.0, 4.5]).average().unwrap();
    assert_eq!(avg, Some(2.5));
}

/// Test integer overflow wraps.
#[test]
fn test_sum_wraps() {
    let sum = NumericPipeline::of(vec![u8::MAX, 2]).sum().unwrap();
    assert_eq!(sum, 1);
}

/// Test numeric collectors on object pipelines.
#[test]
fn test_numeric_collectors() {
    let words = vec!["a", "bb", "ccc", "dddd"];
    let total = Pipeline::of(words.clone())
        .collect_with(summing(|w: &&str| w.len()))
        .unwrap();
    assert_eq!(total, 10);

    let stats = Pipeline::of(words)
        .collect_with(summarizing(|w: &&str| w.len() as i64))
        .unwrap();
    assert_eq!(stats.max(), Some(4));
    assert_eq!(stats.average(), Some(2.5));
}

/// Test unbounded numeric pipelines.
#[test]
fn test_unbounded_numeric() {
    let naturals: NumericPipeline<u64> = rivulet::iterate(1u64, |n| n + 1).into();
    assert!(matches!(naturals.average(), Err(Error::Unbounded { operation: "average" })));
    assert!(naturals.any_match(|n| *n > 1000).unwrap());
    let naturals: NumericPipeline<u64> = rivulet::iterate(1u64, |n| n + 1).into();
    let odd_squares = naturals.filter(|n| n % 2 == 1).map(|n| n * n).limit(4).sum().unwrap();
    assert_eq!(odd_squares, 1 + 9 + 25 + 49);
}
