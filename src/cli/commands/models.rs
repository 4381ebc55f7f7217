//! `ulib models` - list built-in models

use miette::Result;
use serde::Serialize;

use crate::cli::output::{effective_format, print_csv, print_document, render_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::models::reference;

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: &'static str,
    description: &'static str,
    inputs: &'static [&'static str],
    outputs: &'static [&'static str],
}

pub fn run(global: &GlobalOpts) -> Result<()> {
    let infos: Vec<ModelInfo> = reference::models()
        .iter()
        .map(|m| ModelInfo {
            name: m.name,
            description: m.description,
            inputs: m.inputs,
            outputs: m.outputs,
        })
        .collect();

    let rows = infos.iter().map(|m| {
        vec![
            m.name.to_string(),
            m.inputs.join(", "),
            m.outputs.join(", "),
            m.description.to_string(),
        ]
    });
    let header = ["Name", "Inputs", "Outputs", "Description"];

    match effective_format(global.format) {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&infos, global.format),
        OutputFormat::Csv => print_csv(&header, rows),
        _ => {
            println!("{}", render_table(&header, rows));
            Ok(())
        }
    }
}
