//! Integration tests for error expectations and the recording convention.

use std::error::Error as StdError;

use futures::stream;
use testkit_sequence::mock::ScriptedSource;
use testkit_sequence::prelude::*;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
enum FeedError {
    #[error("connection lost after {0} frames")]
    ConnectionLost(usize),
    #[error("malformed frame: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
#[error("timed out")]
struct Timeout;

#[derive(Debug, thiserror::Error)]
#[error("permission denied")]
struct PermissionDenied;

type BoxError = Box<dyn StdError + Send + Sync>;

fn feed(items: &[u32], failure: Option<FeedError>) -> ScriptedSource<u32, FeedError> {
    let source = ScriptedSource::new().items(items.iter().copied());
    match failure {
        Some(error) => source.fail(error),
        None => source,
    }
}

#[tokio::test]
async fn test_any_error_after_elements() {
    let source = feed(&[1, 2], Some(FeedError::ConnectionLost(2)));

    expect_try_stream(source)
        .validate(vec![emit(1_u32), emit(2_u32), expect_error()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_like_matches_variant_not_payload() {
    let source = feed(&[], Some(FeedError::ConnectionLost(7)));

    expect_try_stream(source)
        .validate(vec![expect_error_like(FeedError::ConnectionLost(0))])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_like_rejects_other_variant() {
    let source = feed(&[], Some(FeedError::Malformed("xyz".into())));

    let err = expect_try_stream(source)
        .validate(vec![expect_error_like(FeedError::ConnectionLost(0))])
        .await
        .unwrap_err();

    match err {
        Error::ErrorExpectationMismatch {
            expected_error,
            actual_error,
            index,
            ..
        } => {
            assert!(expected_error.contains("ConnectionLost"));
            assert_eq!(actual_error, "malformed frame: xyz");
            assert_eq!(index, 0);
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_where_predicate() {
    let source = feed(&[1], Some(FeedError::ConnectionLost(1)));

    expect_try_stream(source)
        .validate(vec![
            emit(1_u32),
            expect_error_where(|e: &FeedError| {
                matches!(e, FeedError::ConnectionLost(n) if *n == 1)
            }),
        ])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_of_type_on_boxed_errors() {
    let source = stream::iter(vec![Ok::<u32, BoxError>(5), Err(Box::new(Timeout) as BoxError)]);

    expect_try_stream(source)
        .validate(vec![emit(5_u32), expect_error_of::<Timeout, _, _>()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_of_type_rejects_other_type() {
    let source = stream::iter(vec![Err::<u32, BoxError>(Box::new(PermissionDenied))]);

    let err = expect_try_stream(source)
        .validate(vec![expect_error_of::<Timeout, _, _>()])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(FailureKind::ErrorExpectationMismatch));
    assert!(err.diagnostic().contains("permission denied"));
}

#[tokio::test]
async fn test_error_ends_pass_with_expectations_left() {
    let source = feed(&[1], Some(FeedError::ConnectionLost(1)));

    expect_try_stream(source)
        .validate(vec![emit(1_u32), expect_error(), emit(2_u32), emit(3_u32)])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_element_instead_of_error() {
    let source = feed(&[1, 2], None);

    let err = expect_try_stream(source)
        .validate(vec![emit(1_u32), expect_error()])
        .await
        .unwrap_err();

    match err {
        Error::ExpectedErrorButSequenceSucceeded {
            expected_error,
            index,
            ..
        } => {
            assert_eq!(expected_error, "any error");
            assert_eq!(index, 1);
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_skip_all_leaves_error_expectation_unprocessed() {
    let source = feed(&[1, 2, 3], None);

    let err = expect_try_stream(source)
        .validate(vec![emit(1_u32), skip_all(), expect_error()])
        .await
        .unwrap_err();

    match err {
        Error::InsufficientElements {
            expected,
            actual,
            unprocessed,
            ..
        } => {
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
            assert_eq!(unprocessed, vec!["any error".to_string()]);
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_clean_end_before_later_error_expectation() {
    let source = feed(&[1], None);

    let err = expect_try_stream(source)
        .validate(vec![emit(1_u32), emit(2_u32), expect_error()])
        .await
        .unwrap_err();

    match err {
        Error::ExpectedErrorButSequenceSucceeded {
            expected_error,
            index,
            ..
        } => {
            assert_eq!(expected_error, "any error");
            assert_eq!(index, 2);
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_source_error_passes_through() {
    let source = feed(&[1], Some(FeedError::Malformed("bad".into())));

    let err = expect_try_stream(source)
        .validate(vec![emit(1_u32), emit(2_u32)])
        .await
        .unwrap_err();

    assert!(err.is_source());
    assert_eq!(err.into_source(), Some(FeedError::Malformed("bad".into())));
}

#[tokio::test]
async fn test_source_error_during_skip_while_passes_through() {
    let source = ScriptedSource::<u32, FeedError>::new()
        .items([1, 2, 3])
        .fail(FeedError::ConnectionLost(3));

    let err = expect_try_stream(source)
        .validate(vec![skip_while(|n: &u32| *n < 10), emit(10_u32)])
        .await
        .unwrap_err();

    assert_eq!(err.into_source(), Some(FeedError::ConnectionLost(3)));
}

fn recording_cases() -> Vec<(Vec<u32>, Vec<Expectation<u32, FeedError>>)> {
    vec![
        (vec![1, 2], vec![emit(1_u32), emit(2_u32)]),
        (vec![1, 2], vec![emit(1_u32)]),
        (vec![1], vec![emit(1_u32), emit(2_u32)]),
        (vec![1], vec![emit(1_u32), expect_error()]),
    ]
}

#[tokio::test]
async fn test_recording_matches_propagation() {
    let issues = Issues::new();
    let mut propagated = Vec::new();

    let cases = recording_cases().into_iter().zip(recording_cases());
    for ((elements, recorded), (_, returned)) in cases {
        let passed = expect_try_stream(feed(&elements, None))
            .record(recorded, &issues)
            .await;
        let result = expect_try_stream(feed(&elements, None))
            .validate(returned)
            .await;

        assert_eq!(passed, result.is_ok());
        if let Err(error) = result {
            propagated.push(error.kind());
        }
    }

    let recorded: Vec<_> = issues.take().iter().map(Issue::kind).collect();
    assert_eq!(recorded, propagated);
    assert_eq!(
        recorded,
        vec![
            Some(FailureKind::UnexpectedElement),
            Some(FailureKind::InsufficientElements),
            Some(FailureKind::ExpectedErrorButSequenceSucceeded),
        ]
    );
}

#[tokio::test]
#[should_panic(expected = "Expected: any error")]
async fn test_assert_reports_missing_error() {
    let source = feed(&[1], None);
    expect_try_stream(source)
        .assert(vec![emit(1_u32), expect_error()])
        .await;
}
