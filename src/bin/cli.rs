//! atlasfn CLI
//!
//! Command-line interface for managing and calling store functions.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use atlasfn::{
    Config, ExecutionMode, FunctionResult, Functions, FunctionsConfig, RestorePolicy,
    ReturnType, StringCodec, TcpTransport, Value,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// atlasfn CLI
#[derive(Parser, Debug)]
#[command(name = "atlasfn-cli")]
#[command(about = "Manage and call server-side functions")]
#[command(version)]
struct Args {
    /// Primary server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Read replica address (repeatable)
    #[arg(short, long)]
    replica: Vec<String>,

    /// Read/write timeout in milliseconds (0 disables)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a library from a source file
    Load {
        /// Library name
        name: String,

        /// File with the library code (without the shebang line)
        file: PathBuf,

        /// Replace an existing library with the same name
        #[arg(long)]
        replace: bool,
    },

    /// Delete a library
    Delete {
        /// Library name
        name: String,
    },

    /// Delete every library
    Flush,

    /// List libraries, optionally filtered by a glob pattern
    List {
        pattern: Option<String>,
    },

    /// Write the serialized state of every library to a file
    Dump {
        /// Output file
        out: PathBuf,
    },

    /// Restore libraries from a dump file
    Restore {
        /// Dump file
        file: PathBuf,

        #[arg(long, value_enum, default_value = "append")]
        policy: PolicyArg,
    },

    /// Show the function engine state
    Stats,

    /// Kill the running read-only function
    Kill,

    /// Call a function
    Call {
        /// Function name
        function: String,

        #[arg(short, long, default_value = "read")]
        mode: ExecutionMode,

        /// Return type: boolean, long, list, string, value, mapvalue, mapvaluelist
        #[arg(short = 'R', long, default_value = "string")]
        return_type: ReturnType,

        /// Key passed through KEYS (repeatable)
        #[arg(short, long)]
        key: Vec<String>,

        /// Key used only to pick the node
        #[arg(long)]
        routing_key: Option<String>,

        /// Values passed through ARGV
        values: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Append,
    Replace,
    Flush,
}

impl From<PolicyArg> for RestorePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Append => RestorePolicy::Append,
            PolicyArg::Replace => RestorePolicy::Replace,
            PolicyArg::Flush => RestorePolicy::Flush,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,atlasfn=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .addr(&args.server)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .max_idle(1)
        .max_total(1);
    for replica in &args.replica {
        builder = builder.replica(replica);
    }

    let transport = match TcpTransport::new(builder.build()) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to set up transport: {}", e);
            std::process::exit(2);
        }
    };

    let functions = Functions::new(FunctionsConfig::new(
        Arc::new(transport),
        Arc::new(StringCodec),
        Arc::new(StringCodec),
    ));

    if let Err(e) = run(&functions, args.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(functions: &Functions, command: Commands) -> atlasfn::Result<()> {
    match command {
        Commands::Load { name, file, replace } => {
            let code = fs::read_to_string(&file)?;
            if replace {
                functions.load_and_replace(&name, &code)?;
            } else {
                functions.load(&name, &code)?;
            }
            println!("OK");
        }
        Commands::Delete { name } => {
            functions.delete(&name)?;
            println!("OK");
        }
        Commands::Flush => {
            functions.flush()?;
            println!("OK");
        }
        Commands::List { pattern } => {
            let libraries = match pattern {
                Some(p) => functions.list_matching(&p)?,
                None => functions.list()?,
            };
            for library in libraries {
                println!("{} ({})", library.name, library.engine);
                for function in &library.functions {
                    if function.flags.is_empty() {
                        println!("  {}", function.name);
                    } else {
                        println!("  {} [{}]", function.name, function.flags.join(", "));
                    }
                }
            }
        }
        Commands::Dump { out } => {
            let payload = functions.dump()?;
            fs::write(&out, &payload)?;
            println!("{} bytes written to {}", payload.len(), out.display());
        }
        Commands::Restore { file, policy } => {
            let payload = fs::read(&file)?;
            functions.restore_with(&payload, policy.into())?;
            println!("OK");
        }
        Commands::Stats => {
            let stats = functions.stats()?;
            match stats.running {
                Some(running) => println!(
                    "running: {} for {:?} ({})",
                    running.name,
                    running.duration,
                    running.command.join(" ")
                ),
                None => println!("running: none"),
            }
            for engine in stats.engines {
                println!(
                    "{}: {} libraries, {} functions",
                    engine.engine, engine.libraries_count, engine.functions_count
                );
            }
        }
        Commands::Kill => {
            println!("{:?}", functions.kill()?);
        }
        Commands::Call {
            function,
            mode,
            return_type,
            key,
            routing_key,
            values,
        } => {
            let values: Vec<Value> = values.into_iter().map(Value::Str).collect();
            let result = functions.call(
                routing_key.as_deref().map(str::as_bytes),
                mode,
                &function,
                return_type,
                &key,
                &values,
            )?;
            print_result(result);
        }
    }
    Ok(())
}

fn print_result(result: FunctionResult) {
    match result {
        FunctionResult::Boolean(b) => println!("{}", b),
        FunctionResult::Long(Some(n)) => println!("{}", n),
        FunctionResult::String(Some(s)) => println!("{}", s),
        FunctionResult::Value(Some(v)) | FunctionResult::MapValue(Some(v)) => print_value(&v, 0),
        FunctionResult::List(items) | FunctionResult::MapValueList(items) => {
            for item in &items {
                print_value(item, 0);
            }
        }
        FunctionResult::Long(None)
        | FunctionResult::String(None)
        | FunctionResult::Value(None)
        | FunctionResult::MapValue(None) => println!("(nil)"),
    }
}

fn print_value(value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Value::List(items) => {
            for item in items {
                print_value(item, depth + 1);
            }
        }
        Value::Nil => println!("{}(nil)", indent),
        Value::Str(s) => println!("{}{}", indent, s),
        Value::Int(n) => println!("{}{}", indent, n),
        Value::Float(n) => println!("{}{}", indent, n),
        Value::Bool(b) => println!("{}{}", indent, b),
        Value::Bytes(b) => println!("{}{:?}", indent, b),
    }
}
