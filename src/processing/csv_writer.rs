use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use glam::DVec2;

use crate::numerics::transient::FieldHistory;

/// Write columns of data to a CSV file with headers.
pub fn write_csv<P: AsRef<Path>>(path: P, headers: &[&str], data: &[Vec<f64>]) -> io::Result<()> {
    if !headers.is_empty() && !data.is_empty() && headers.len() != data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Headers count ({}) doesn't match data columns ({})",
                headers.len(),
                data.len()
            ),
        ));
    }

    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "{}", headers.join(","))?;

    let n_rows = data.iter().map(|col| col.len()).max().unwrap_or(0);

    for i in 0..n_rows {
        let row: Vec<String> = data
            .iter()
            .map(|col| {
                if i < col.len() {
                    format!("{:.15e}", col[i])
                } else {
                    String::new()
                }
            })
            .collect();
        writeln!(file, "{}", row.join(","))?;
    }

    file.flush()
}

/// One time level: `x, y, approx, exact, error` per node.
pub fn write_snapshot<P: AsRef<Path>>(
    path: P,
    positions: &[DVec2],
    approx: &FieldHistory,
    exact: &FieldHistory,
    step: usize,
) -> io::Result<()> {
    if positions.len() != approx.node_count() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Positions ({}) don't match field nodes ({})",
                positions.len(),
                approx.node_count()
            ),
        ));
    }
    let a: Vec<f64> = approx.step(step).iter().copied().collect();
    let e: Vec<f64> = exact.step(step).iter().copied().collect();
    let err: Vec<f64> = a.iter().zip(&e).map(|(a, e)| (a - e).abs()).collect();
    write_csv(
        path,
        &["x", "y", "approx", "exact", "error"],
        &[
            positions.iter().map(|p| p.x).collect(),
            positions.iter().map(|p| p.y).collect(),
            a,
            e,
            err,
        ],
    )
}

/// Error metric over time.
pub fn write_error_history<P: AsRef<Path>>(
    path: P,
    times: &[f64],
    errors: &[f64],
) -> io::Result<()> {
    if times.len() != errors.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Times and errors lengths don't match ({} vs {})",
                times.len(),
                errors.len()
            ),
        ));
    }
    write_csv(path, &["t", "error"], &[times.to_vec(), errors.to_vec()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_csv() {
        let path = std::env::temp_dir().join("gfd_test_output.csv");
        let headers = &["x", "y", "z"];
        let data = vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ];

        write_csv(&path, headers, &data).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("x,y,z\n"));
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn snapshot_has_one_row_per_node() {
        let path = std::env::temp_dir().join("gfd_test_snapshot.csv");
        let positions = vec![DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.5)];
        let field = FieldHistory::zeros(2, 3);
        write_snapshot(&path, &positions, &field, &field, 2).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("x,y,approx,exact,error\n"));
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn mismatched_history_is_rejected() {
        let path = std::env::temp_dir().join("gfd_test_bad_history.csv");
        let err = write_error_history(&path, &[0.0, 1.0], &[0.1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
