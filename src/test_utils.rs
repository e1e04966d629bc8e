use std::path::{Path, PathBuf};

use anyhow::bail;
use itertools::Itertools;
use serde::Deserialize;

/// Expected outcome of one line of a fixture. A missing `output` means the
/// printed value is not checked.
#[derive(Debug, Deserialize)]
pub struct Expected {
    pub ok: bool,
    #[serde(default)]
    pub output: Option<String>,
}

const TESTCASES: usize = 10;

fn load_input_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let source = std::fs::read_to_string(path)?;
    Ok(source.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect_vec())
}

fn load_output_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Expected>> {
    let source = std::fs::read(path)?;
    let result: Vec<Expected> = serde_json::from_slice(&source)?;
    Ok(result)
}

pub fn load_test_pair(testcase: usize) -> anyhow::Result<Vec<(String, Expected)>> {
    if testcase == 0 || testcase > TESTCASES { bail!("Testcase out of bounds"); }

    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let input = load_input_file(base_path.join("test_inputs").join(format!("{}.yal", testcase)))?;
    let output = load_output_file(base_path.join("test_outputs").join(format!("{}.json", testcase)))?;

    if input.len() != output.len() { bail!("Input and output of testcase {} do not match", testcase); }
    Ok(input.into_iter().zip(output).collect_vec())
}

pub fn all_testcases() -> impl Iterator<Item = usize> {
    1..=TESTCASES
}
