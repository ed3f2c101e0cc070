use float_cmp::assert_approx_eq;
use heatrun::parser;
use heatrun::plot::{render, RenderOptions};
use heatrun::Error;
use std::io::Write;
use tempfile::NamedTempFile;

fn output_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "100 100 0.01\niter = 42  difmax = 0.0098\n\n{body}").unwrap();
    file
}

#[test]
fn parse_then_render_two_by_two() {
    let file = output_file("1.0 2.0\n3.0 4.0\n");
    let parsed = parser::parse(&file.path()).unwrap();
    assert_eq!(parsed.grid.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two.png");
    let options = RenderOptions {
        dpi: 50,
        ..Default::default()
    };
    let artifact = render(&parsed.grid, "Two by two", &path, &options).unwrap();
    assert_eq!(artifact.dpi, 50);
    assert!(artifact.tight);
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn parses_every_value() {
    let rows = 6;
    let cols = 9;
    let mut body = String::new();
    for r in 0..rows {
        for c in 0..cols {
            body.push_str(&format!("{} ", 30.0 + r as f64 * 0.5 + c as f64 / 3.0));
        }
        body.push('\n');
    }
    let file = output_file(&body);
    let parsed = parser::parse(&file.path()).unwrap();
    assert_eq!(parsed.grid.shape(), (rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            assert_approx_eq!(
                f64,
                parsed.grid.get(r, c),
                30.0 + r as f64 * 0.5 + c as f64 / 3.0,
                ulps = 2
            );
        }
    }
    assert_eq!(parsed.header.iterations(), Some(42));
}

#[test]
fn header_only_file_is_empty_grid() {
    let file = output_file("");
    let parsed = parser::parse(&file.path()).unwrap();
    assert!(parsed.grid.is_empty());
}

#[test]
fn non_numeric_token_in_file() {
    let file = output_file("1.0 2.0\n3.0 four\n");
    assert!(matches!(
        parser::parse(&file.path()),
        Err(Error::MalformedOutput { line: 5, .. })
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("output.txt");
    assert!(matches!(parser::parse(&missing), Err(Error::Io { .. })));
}

#[test]
fn full_figure_without_crop() {
    let file = output_file("30 30 30\n40 60 90\n50 50 50\n");
    let parsed = parser::parse(&file.path()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("full.png");
    let options = RenderOptions {
        dpi: 30,
        tight: false,
        ..Default::default()
    };
    let artifact = render(&parsed.grid, "Full", &path, &options).unwrap();
    assert_eq!((artifact.width_px, artifact.height_px), (240, 180));
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (240, 180));
}
