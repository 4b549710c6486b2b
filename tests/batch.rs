use std::{path::PathBuf, sync::Arc};

use fire_danger::{batch, params, Pipeline};
use tokio_test::io::Builder;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn pipeline() -> Pipeline {
    let scaler = params::load_scaler(fixture("scaler.json")).unwrap();
    let model = params::load_ridge(fixture("ridge.json")).unwrap();
    Pipeline::new(Arc::new(scaler), Arc::new(model))
}

#[tokio::test]
async fn one_result_line_per_input_line() {
    let input = b"# temperature, rh, ws, rain, ffmc, dmc, isi, classes, region\n\
        25,60,15,0,85,10,5,0,0\n\
        \n\
        Temprature=25,RH=60,WS=15,Rain=0,FFMC=85,DMC=10,ISI=5,Classes=not fire,Region=Bejaia\n\
        25,60,15\n";

    let mut output = Vec::new();
    let summary = batch::run(&pipeline(), &input[..], &mut output).await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "16.30\n16.30\nError: expected 9 comma separated values, got 3\n"
    );
}

#[tokio::test]
async fn invalid_values_do_not_stop_the_run() {
    let input = Builder::new()
        .read(b"25,60,15,0,85,10,5,0,abc\n")
        .read(b"25,60,15,0,85,10,5,0,0")
        .build();
    let output = Builder::new()
        .write(b"Error: invalid input: Region 'abc' is not a number\n")
        .write(b"16.30\n")
        .build();

    let summary = batch::run(&pipeline(), input, output).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn read_failures_abort_the_run() {
    let input = Builder::new()
        .read(b"25,60,15,0,85,10,5,0,0\n")
        .read_error(std::io::Error::other("disk gone"))
        .build();
    let output = Builder::new().write(b"16.30\n").build();

    let err = batch::run(&pipeline(), input, output).await.unwrap_err();
    assert_eq!(err.to_string(), "disk gone");
}

#[tokio::test]
async fn oversized_lines_are_reported_and_skipped() {
    let mut input = format!("# {}\n", "x".repeat(5000));
    input.push_str("25,60,15,0,85,10,5,0,0\n");
    input.push_str(&format!("{}\n", "1,".repeat(3000)));
    input.push_str("25,60,15,0,85,10,5,0,0");

    let mut output = Vec::new();
    let summary = batch::run(&pipeline(), input.as_bytes(), &mut output)
        .await
        .unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.failed, 2);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "Error: line longer than 4096 bytes\n16.30\n\
         Error: line longer than 4096 bytes\n16.30\n"
    );
}
