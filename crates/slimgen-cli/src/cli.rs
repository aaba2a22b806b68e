use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "slimgen")]
#[command(
    about = "Compile a code snippet against a library source corpus into a minimal assembly",
    long_about = None
)]
pub struct Cli {
    /// The output file to write to (placed under <root>/Output)
    #[arg(short = 'f', long = "file", value_name = "OUTPUT_FILE")]
    pub file: String,

    /// The .NET Framework version to target (net35 or net40)
    #[arg(
        short = 'd',
        long = "dotnet-framework",
        visible_alias = "dotnet",
        value_name = "DOTNET_VERSION"
    )]
    pub dotnet_framework: Option<String>,

    /// The output kind to use (dll or console)
    #[arg(short = 'o', long = "output-kind", value_name = "OUTPUT_KIND")]
    pub output_kind: Option<String>,

    /// The platform to use (AnyCpu, x86, or x64)
    #[arg(short = 'p', long, value_name = "PLATFORM")]
    pub platform: Option<String>,

    /// Don't use source code optimization
    #[arg(short = 'n', long)]
    pub no_optimization: bool,

    /// The name of the assembly to be generated
    #[arg(short = 'a', long, value_name = "ASSEMBLY_NAME")]
    pub assembly_name: Option<String>,

    /// The source code file to compile
    #[arg(short = 's', long, value_name = "SOURCE_FILE")]
    pub source_file: Option<PathBuf>,

    /// The name of the class to be generated
    #[arg(short = 'c', long, value_name = "CLASS_NAME")]
    pub class_name: Option<String>,

    /// Directory holding Source/, References/, Resources/ and Output/
    #[arg(long, env = "SLIMGEN_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Write the build report (JSON) to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Source code to compile when no source file is given
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "CODE")]
    pub code: Vec<String>,
}
