//! Entrypoint for CLI
use std::{env, error::Error, path::PathBuf, process};

use jackc::{
    compile::{CompileConf, ListProbe},
    driver::{collect_sources, compile_path, compile_source_file},
    IMPL_VERSION,
};
use log::{error, info};

static USAGE: &str = r#"
usage: jackc [OPTIONS] PATH

Compiles a .jack file, or every .jack file in a directory,
into a .vm file next to each source.

options:
    --speculative   Decide empty argument lists by a speculative dry-run parse
    --stdout        Print generated code instead of writing .vm files
    -h, --help      Show this text

examples:
    jackc Main.jack
    jackc --stdout Square/
"#;

/// FreeBSD EX_USAGE (64)
const EX_USAGE: i32 = 64;

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    let cmd = match parse_args(env::args().skip(1)) {
        Ok(Cmd::Help) => {
            print_usage();
            return Ok(());
        }
        Ok(Cmd::Compile(opts)) => opts,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            process::exit(EX_USAGE)
        }
    };

    let ok = if cmd.stdout {
        print_code(&cmd)
    } else {
        let report = compile_path(&cmd.path, &cmd.conf);
        info!(
            "{} compiled, {} failed",
            report.compiled.len(),
            report.failed.len()
        );
        report.is_success()
    };

    if !ok {
        process::exit(1);
    }

    Ok(())
}

/// Compile every source and print the code, without writing files.
fn print_code(cmd: &CompileOpts) -> bool {
    let sources = match collect_sources(&cmd.path) {
        Ok(sources) => sources,
        Err(err) => {
            error!("{}: {err}", cmd.path.display());
            return false;
        }
    };

    let mut ok = true;
    for path in sources {
        match compile_source_file(&path, &cmd.conf) {
            Ok(text) => {
                println!("// {}", path.display());
                print!("{text}");
            }
            Err(err) => {
                error!("compilation error\n{err}");
                ok = false;
            }
        }
    }
    ok
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Cmd, String> {
    let mut conf = CompileConf::default();
    let mut stdout = false;
    let mut path = None;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Cmd::Help),
            "--speculative" => conf.list_probe = ListProbe::Speculative,
            "--stdout" => stdout = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option '{flag}'")),
            _ if path.is_some() => return Err(format!("unexpected argument '{arg}'")),
            _ => path = Some(PathBuf::from(&arg)),
        }
    }

    match path {
        Some(path) => Ok(Cmd::Compile(CompileOpts { path, stdout, conf })),
        None => Err("missing PATH".to_owned()),
    }
}

fn print_usage() {
    println!("jackc v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    Help,
    /// Compile file or directory
    Compile(CompileOpts),
}

struct CompileOpts {
    path: PathBuf,
    /// Print code instead of writing files.
    stdout: bool,
    conf: CompileConf,
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        match parse_args(args(&["--speculative", "--stdout", "Main.jack"])) {
            Ok(Cmd::Compile(opts)) => {
                assert_eq!(opts.path, PathBuf::from("Main.jack"));
                assert!(opts.stdout);
                assert_eq!(opts.conf.list_probe, ListProbe::Speculative);
            }
            _ => panic!("expected compile command"),
        }

        match parse_args(args(&["src"])) {
            Ok(Cmd::Compile(opts)) => {
                assert!(!opts.stdout);
                assert_eq!(opts.conf.list_probe, ListProbe::FirstSet);
            }
            _ => panic!("expected compile command"),
        }
    }

    #[test]
    fn test_parse_args_usage() {
        assert!(matches!(parse_args(args(&["-h"])), Ok(Cmd::Help)));
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--fast", "a.jack"])).is_err());
        assert!(parse_args(args(&["a.jack", "b.jack"])).is_err());
    }
}
