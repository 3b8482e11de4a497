use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "opbridge",
    version,
    about = "Invoke legacy operators through the boxed dispatcher"
)]
pub struct Cli {
    /// Log filter (RUST_LOG syntax)
    #[arg(long, global = true, default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered operator schemas and their dispatch keys
    List,

    /// Call an operator with values built from the command line
    Invoke {
        /// Operator name without the legacy namespace (e.g. Add)
        op: String,

        /// Tensor argument, `1,2,3` or `2x2:1,2,3,4`; repeat in argument order
        #[arg(long = "tensor")]
        tensors: Vec<String>,

        /// Scalar argument; repeat in argument order
        #[arg(long = "value")]
        values: Vec<String>,

        /// Offer preallocated output tensors for reuse
        #[arg(long)]
        preallocate: bool,

        /// Kernel device class (cpu, cuda:N or hip:N); inferred from inputs if unset
        #[arg(long)]
        device: Option<String>,
    },
}
