//! xgress-policies: turns Kubernetes NetworkPolicy manifests into the graph
//! JSON the viewer loads.

use std::fs;
use std::path::PathBuf;
use std::process;

use xgress_view::policy;

const HELP_TEXT: &str = "\
Convert Kubernetes NetworkPolicy manifests into viewer graph JSON

USAGE:
    xgress-policies <POLICIES.yaml> [OPTIONS]

OPTIONS:
    --out=PATH    Where to write the graph (default: graph.json)
    --help, -h    Show this help message
";

#[derive(Debug, PartialEq)]
struct CliArgs {
	input: PathBuf,
	output: PathBuf,
}

#[derive(Debug, PartialEq)]
enum Command {
	Run(CliArgs),
	Help,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
	let mut input = None;
	let mut output = PathBuf::from("graph.json");
	for arg in args.iter().skip(1) {
		match arg.as_str() {
			"--help" | "-h" => return Ok(Command::Help),
			_ if arg.starts_with("--out=") => output = PathBuf::from(&arg["--out=".len()..]),
			_ if arg.starts_with('-') => return Err(format!("unknown option '{arg}'")),
			_ if input.is_none() => input = Some(PathBuf::from(arg)),
			_ => return Err(format!("unexpected argument '{arg}'")),
		}
	}
	let input = input.ok_or_else(|| "missing policies file".to_string())?;
	Ok(Command::Run(CliArgs { input, output }))
}

fn main() {
	let args: Vec<String> = std::env::args().collect();
	let cli_args = match parse_args(&args) {
		Ok(Command::Run(cli_args)) => cli_args,
		Ok(Command::Help) => {
			print!("{HELP_TEXT}");
			return;
		}
		Err(msg) => {
			eprintln!("error: {msg}\n\n{HELP_TEXT}");
			process::exit(2);
		}
	};

	let yaml = match fs::read_to_string(&cli_args.input) {
		Ok(yaml) => yaml,
		Err(e) => {
			eprintln!("Error reading '{}': {e}", cli_args.input.display());
			process::exit(1);
		}
	};
	let graph = match policy::graph_from_policies(&yaml) {
		Ok(graph) => graph,
		Err(e) => {
			eprintln!("Error: {e}");
			process::exit(1);
		}
	};
	let written = graph
		.to_json()
		.map_err(|e| e.to_string())
		.and_then(|json| fs::write(&cli_args.output, json).map_err(|e| e.to_string()));
	if let Err(e) = written {
		eprintln!("Error writing '{}': {e}", cli_args.output.display());
		process::exit(1);
	}
	println!(
		"{} nodes, {} links -> {}",
		graph.nodes.len(),
		graph.links.len(),
		cli_args.output.display()
	);
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(list: &[&str]) -> Vec<String> {
		std::iter::once("xgress-policies")
			.chain(list.iter().copied())
			.map(String::from)
			.collect()
	}

	#[test]
	fn input_with_default_output() {
		assert_eq!(
			parse_args(&args(&["policies.yaml"])),
			Ok(Command::Run(CliArgs {
				input: "policies.yaml".into(),
				output: "graph.json".into(),
			}))
		);
	}

	#[test]
	fn output_override_and_help() {
		assert_eq!(
			parse_args(&args(&["--out=data/graph.json", "p.yaml"])),
			Ok(Command::Run(CliArgs {
				input: "p.yaml".into(),
				output: "data/graph.json".into(),
			}))
		);
		assert_eq!(parse_args(&args(&["p.yaml", "-h"])), Ok(Command::Help));
	}

	#[test]
	fn bad_arguments_are_rejected() {
		assert!(parse_args(&args(&[])).is_err());
		assert!(parse_args(&args(&["a.yaml", "b.yaml"])).is_err());
		assert!(parse_args(&args(&["--verbose", "a.yaml"])).is_err());
	}
}
