use clap::Parser;

#[derive(Parser)]
pub struct Cli {
    /// Volume label
    #[arg(long, default_value = "disk0")]
    pub label: String,

    /// Volume capacity in blocks
    #[arg(long, default_value_t = 60)]
    pub blocks: u32,

    /// Synthetic requests to replay
    #[arg(long, short, default_value_t = 100)]
    pub requests: usize,

    /// Worker threads for the concurrent pass
    #[arg(long, short, default_value_t = 4)]
    pub threads: usize,

    /// Workload seed
    #[arg(long, default_value_t = 0x2545F491)]
    pub seed: u64,
}
