// Copyright 2024 The Subsplit Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Entry point for the `subsplit` command-line tool.

mod args;
mod command_error;
mod logging;
mod progress;
mod project_config;
mod publish;
mod split_command;

use std::process::ExitCode;

use clap::Parser;

use args::{Cli, Command};
use command_error::CommandError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let debug = match &cli.command {
        Command::Split(args) => args.debug,
        Command::Publish(args) => args.debug,
    };
    logging::init(debug);

    match run(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

fn run(command: &Command) -> Result<(), CommandError> {
    match command {
        Command::Split(args) => {
            let head = split_command::run(args)?;
            println!("{head}");
            Ok(())
        }
        Command::Publish(args) => publish::run(args),
    }
}
