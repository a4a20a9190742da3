use anyhow::Result;

fn main() -> Result<()> {
    mastermind_box::cli::run()
}
