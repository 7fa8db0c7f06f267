fn main() -> anyhow::Result<()> {
    plugin_web::cli::run()
}
