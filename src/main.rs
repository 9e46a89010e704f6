fn main() -> std::process::ExitCode {
    mediscan_lib::run()
}
