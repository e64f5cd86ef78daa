fn main() -> anyhow::Result<()> {
    odysseykit::cli::run_cli()
}
