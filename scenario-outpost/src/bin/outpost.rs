/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::{fs, io, process};

use clap::{App, Arg};
use rayon::prelude::*;

use scenario_outpost::{simulate, Config, Report, Result, ScenarioError, Summary};

fn run_batch(config: &Config) -> Result<Vec<Report>> {
    let runs = config.batch.runs.max(1);
    if runs == 1 {
        return Ok(vec![simulate(config, 0)?]);
    }
    (0..runs)
        .into_par_iter()
        .map(|run| simulate(config, run))
        .collect()
}

fn write_reports(path: &str, reports: &[Report]) -> Result<()> {
    let file = fs::File::create(path).map_err(|source| ScenarioError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), reports)?;
    Ok(())
}

fn main() {
    env_logger::init();

    let matches = App::new("Outpost")
        .version("1.0")
        .about("Runs outpost skirmishes between grunts and hounds")
        .arg(
            Arg::with_name("config")
                .required(true)
                .help("Sets config file path, - for the standard input"),
        )
        .arg(
            Arg::with_name("output")
                .required(false)
                .takes_value(true)
                .value_name("file")
                .short("o")
                .long("output")
                .help("Writes the reports of all runs to this file"),
        )
        .arg(
            Arg::with_name("runs")
                .required(false)
                .takes_value(true)
                .value_name("count")
                .short("r")
                .long("runs")
                .validator(|str| {
                    str.parse::<usize>()
                        .map(|_| ())
                        .map_err(|_| "Invalid number of runs".to_owned())
                })
                .help("Overrides the number of runs of the batch"),
        )
        .arg(
            Arg::with_name("set")
                .required(false)
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .short("s")
                .long("set")
                .validator(|str| {
                    if str.contains('=') {
                        Ok(())
                    } else {
                        Err("Invalid format, should be \"some.path=value\"".to_owned())
                    }
                })
                .help("Manually override a value in the config"),
        )
        .get_matches();

    let config_path = matches.value_of("config").unwrap_or("-");
    let overrides = matches.values_of("set").into_iter().flatten();
    let mut config = match Config::load(config_path, overrides) {
        Ok(config) => config,
        Err(e) => {
            println!("Cannot load config {}: {}", config_path, e);
            process::exit(1);
        }
    };
    if let Some(runs) = matches
        .value_of("runs")
        .and_then(|runs| runs.parse::<usize>().ok())
    {
        config.batch.runs = runs;
    }

    let reports = match run_batch(&config) {
        Ok(reports) => reports,
        Err(e) => {
            println!("Cannot run scenario: {}", e);
            process::exit(2);
        }
    };

    if let Some(path) = matches.value_of("output") {
        if let Err(e) = write_reports(path, &reports) {
            println!("Cannot write reports: {}", e);
            process::exit(3);
        }
    }

    let summary = Summary::from_reports(&reports);
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            println!("Cannot serialize summary: {}", e);
            process::exit(3);
        }
    }
}
