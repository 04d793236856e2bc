//! # Scheduling Simulator
//!
//! Main entry point for a simulation run.

use schedsimd::{prompt_policy, prompt_task_count, render_summary, HostConfig, SimRuntime};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("schedsimd");

    let mut config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(program);
        process::exit(1);
    });

    if let Err(e) = resolve_interactive(&mut config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let runtime = SimRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    match runtime.run() {
        Ok(report) => print!("{}", render_summary(&report)),
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            process::exit(1);
        }
    }
}

/// Prompts on the terminal for anything the flags left out
fn resolve_interactive(config: &mut HostConfig) -> Result<(), schedsimd::HostError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    if config.policy.is_none() {
        config.policy = Some(prompt_policy(&mut input, &mut output)?);
    }
    if config.task_count.is_none() {
        config.task_count = Some(prompt_task_count(&mut input, &mut output)?);
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<HostConfig, String> {
    let mut config = HostConfig::default();
    let mut config_file: Option<PathBuf> = None;
    let mut seed = None;
    let mut slice_ms = None;
    let mut unblock_ms = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--policy" | "-p" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --policy".to_string());
                }
                config.policy = Some(args[i].parse().map_err(|e| format!("{}", e))?);
            }
            "--tasks" | "-n" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --tasks".to_string());
                }
                config.task_count = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("Invalid task count: {}", args[i]))?,
                );
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --seed".to_string());
                }
                seed = Some(
                    args[i]
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid seed: {}", args[i]))?,
                );
            }
            "--log" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --log".to_string());
                }
                config.log_path = PathBuf::from(&args[i]);
            }
            "--quiet" | "-q" => {
                config.echo_log = false;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            "--slice-ms" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --slice-ms".to_string());
                }
                slice_ms = Some(
                    args[i]
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid slice-ms value: {}", args[i]))?,
                );
            }
            "--unblock-ms" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --unblock-ms".to_string());
                }
                unblock_ms = Some(
                    args[i]
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid unblock-ms value: {}", args[i]))?,
                );
            }
            "--report-json" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --report-json".to_string());
                }
                config.report_json = Some(PathBuf::from(&args[i]));
            }
            "--help" | "-h" => {
                print_usage(args.first().map(String::as_str).unwrap_or("schedsimd"));
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    // Explicit flags win over the config file regardless of order.
    if let Some(path) = config_file {
        config.sim = HostConfig::load_sim_config(&path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
    }
    if let Some(seed) = seed {
        config.sim.seed = Some(seed);
    }
    if let Some(slice_ms) = slice_ms {
        config.sim.slice_ms = slice_ms;
    }
    if let Some(unblock_ms) = unblock_ms {
        config.sim.unblock_interval_ms = unblock_ms;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --policy <POLICY>    priority, rr, fcfs or mlfq (or 1-4)");
    eprintln!("  -n, --tasks <N>          Number of tasks to generate");
    eprintln!("  --seed <N>               RNG seed (default: derived from the clock)");
    eprintln!("  --log <FILE>             Event log file (default: scheduler.log)");
    eprintln!("  -q, --quiet              Do not echo log lines to stdout");
    eprintln!("  -v, --verbose            Include debug entries in the log");
    eprintln!("  -c, --config <FILE>      JSON simulation config");
    eprintln!("  --slice-ms <MS>          Time slice length (default: 100)");
    eprintln!("  --unblock-ms <MS>        Unblocker polling interval (default: 200)");
    eprintln!("  --report-json <FILE>     Write the final report as JSON");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Policy and task count are prompted for when not given.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --policy rr --tasks 5", program);
    eprintln!("  {} -p mlfq -n 10 --seed 42 --quiet --report-json run.json", program);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::SchedulingPolicy;
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("schedsimd")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_no_flags_leaves_prompts_open() {
        let config = parse_args(&args(&[])).unwrap();
        assert_eq!(config.policy, None);
        assert_eq!(config.task_count, None);
        assert!(config.echo_log);
        assert!(!config.verbose);
    }

    #[test]
    fn test_full_flag_set() {
        let config = parse_args(&args(&[
            "-p", "mlfq", "-n", "8", "--seed", "42", "--log", "run.log", "--quiet", "-v",
            "--slice-ms", "50", "--unblock-ms", "20", "--report-json", "out.json",
        ]))
        .unwrap();
        assert_eq!(config.policy, Some(SchedulingPolicy::Mlfq));
        assert_eq!(config.task_count, Some(8));
        assert_eq!(config.sim.seed, Some(42));
        assert_eq!(config.log_path, PathBuf::from("run.log"));
        assert!(!config.echo_log);
        assert!(config.verbose);
        assert_eq!(config.sim.slice_ms, 50);
        assert_eq!(config.sim.unblock_interval_ms, 20);
        assert_eq!(config.report_json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"slice_ms": 30, "capacity": 5}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = parse_args(&args(&["--slice-ms", "70", "--config", &path])).unwrap();
        assert_eq!(config.sim.slice_ms, 70);
        assert_eq!(config.sim.capacity, 5);
        assert_eq!(config.sim.unblock_interval_ms, 200);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_args(&args(&["--policy", "lottery"])).is_err());
        assert!(parse_args(&args(&["--tasks", "-3"])).is_err());
        assert!(parse_args(&args(&["--slice-ms", "0"])).is_err());
        assert!(parse_args(&args(&["--seed"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }
}
