//! Solver output parsing
//!
//! The solver prints a fixed-size header followed by one line per grid row.
//! The header is kept verbatim; only the data section becomes a grid.

use crate::error::*;
use crate::grid::TemperatureGrid;
use log::debug;
use std::path::Path;

/// Shape of the solver's output header.
pub struct HeaderInfo;

impl HeaderInfo {
    /// Lines preceding the data section.
    pub const LINES: usize = 3;
}

/// The header lines exactly as the solver wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverHeader {
    pub lines: Vec<String>,
}

impl SolverHeader {
    /// Value following `key =` anywhere in the header,
    /// e.g. `iter = 120  difmax = 0.0099`.
    fn keyed_value(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let mut tokens = line.split_whitespace();
            while let Some(t) = tokens.next() {
                if t == key && tokens.next() == Some("=") {
                    return tokens.next();
                }
            }
            None
        })
    }

    /// Iterations the solver needed to converge, if it reported them.
    pub fn iterations(&self) -> Option<u64> {
        self.keyed_value("iter")?.parse().ok()
    }

    /// Final maximum update difference, if reported.
    pub fn max_difference(&self) -> Option<f64> {
        self.keyed_value("difmax")?.parse().ok()
    }

    /// The `rows cols tolerance` echo on the first line, if present.
    pub fn echoed_parameters(&self) -> Option<(usize, usize, f64)> {
        let mut tokens = self.lines.first()?.split_whitespace();
        let rows = tokens.next()?.parse().ok()?;
        let cols = tokens.next()?.parse().ok()?;
        let tol = tokens.next()?.parse().ok()?;
        if tokens.next().is_some() {
            return None;
        }
        Some((rows, cols, tol))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub header: SolverHeader,
    pub grid: TemperatureGrid,
}

/// Parse captured solver output from a file.
pub fn parse<P: AsRef<Path>>(path: &P) -> Result<ParsedOutput> {
    profiling::scope!("parser::parse");
    let path = path.as_ref();
    debug!("Reading solver output: {:?}", path);
    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("reading {path:?}"), e))?;
    match std::str::from_utf8(&bytes) {
        Ok(text) => parse_str(text),
        Err(e) => {
            let valid = &bytes[..e.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            Err(Error::malformed(line, "output is not valid UTF-8"))
        }
    }
}

/// Parse solver output held in memory.
pub fn parse_str(text: &str) -> Result<ParsedOutput> {
    let mut lines = text.lines().enumerate();

    let header = SolverHeader {
        lines: lines
            .by_ref()
            .take(HeaderInfo::LINES)
            .map(|(_, l)| l.to_string())
            .collect(),
    };

    let mut values = Vec::new();
    let mut width = None;
    let mut rows = 0;
    for (i, line) in lines {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let start = values.len();
        for token in line.split_whitespace() {
            let v: f64 = token.parse().map_err(|_| {
                Error::malformed(line_no, format!("{token:?} is not a number"))
            })?;
            values.push(v);
        }
        let found = values.len() - start;
        match width {
            None => width = Some(found),
            Some(expected) if expected != found => {
                return Err(Error::malformed(
                    line_no,
                    format!("expected {expected} values, found {found}"),
                ));
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let grid = match width {
        Some(cols) => TemperatureGrid::from_row_slice(rows, cols, &values),
        None => TemperatureGrid::empty(),
    };
    debug!("Parsed {} x {} grid", grid.rows(), grid.cols());
    Ok(ParsedOutput { header, grid })
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    const GAUSS_HEADER: &str = "2 2 0.01\niter = 17  difmax = 0.00912\n\n";

    #[test]
    fn two_by_two() {
        let text = format!("{GAUSS_HEADER}1.0 2.0\n3.0 4.0\n");
        let out = parse_str(&text).unwrap();
        assert_eq!(out.grid.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(out.header.lines.len(), 3);
    }

    #[test]
    fn trailing_spaces_and_blank_lines() {
        // The gauss solver leaves a space after every value.
        let text = format!("{GAUSS_HEADER}30 30 30 \n\n40 35.5 90 \n");
        let out = parse_str(&text).unwrap();
        assert_eq!(out.grid.shape(), (2, 3));
        assert_eq!(out.grid.get(1, 1), 35.5);
    }

    #[test]
    fn header_only_is_empty() {
        let out = parse_str(GAUSS_HEADER).unwrap();
        assert!(out.grid.is_empty());

        let out = parse_str("just one line").unwrap();
        assert!(out.grid.is_empty());
        assert_eq!(out.header.lines, vec!["just one line".to_string()]);
    }

    #[test]
    fn non_numeric_token() {
        let text = format!("{GAUSS_HEADER}1.0 2.0\n3.0 abc\n");
        match parse_str(&text) {
            Err(Error::MalformedOutput { line, reason }) => {
                assert_eq!(line, 5);
                assert!(reason.contains("abc"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn ragged_rows() {
        let text = format!("{GAUSS_HEADER}1.0 2.0\n3.0\n");
        match parse_str(&text) {
            Err(Error::MalformedOutput { line, reason }) => {
                assert_eq!(line, 5);
                assert_eq!(reason, "expected 2 values, found 1");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn header_is_not_parsed_as_data() {
        // Header lines are dropped even if they look numeric.
        let text = "1 2 3\n4 5 6\n7 8 9\n10 11\n";
        let out = parse_str(text).unwrap();
        assert_eq!(out.grid.to_rows(), vec![vec![10.0, 11.0]]);
    }

    #[test]
    fn invalid_utf8_names_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let mut bytes = GAUSS_HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"1.0 2.0\n3.0 \xff\n");
        std::fs::write(&path, bytes).unwrap();
        match parse(&path) {
            Err(Error::MalformedOutput { line, reason }) => {
                assert_eq!(line, 5);
                assert!(reason.contains("UTF-8"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn header_accessors() {
        let out = parse_str(GAUSS_HEADER).unwrap();
        assert_eq!(out.header.iterations(), Some(17));
        assert_eq!(out.header.max_difference(), Some(0.00912));
        assert_eq!(out.header.echoed_parameters(), Some((2, 2, 0.01)));

        let out = parse_str("solver v2\nno stats\n\n").unwrap();
        assert_eq!(out.header.iterations(), None);
        assert_eq!(out.header.echoed_parameters(), None);
    }
}
