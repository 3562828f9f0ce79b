fn main() -> Result<(), Box<dyn std::error::Error>> {
    matollama::cli::main()
}
