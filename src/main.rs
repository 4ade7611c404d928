use std::process;

fn main() {
    let mut cli = luapack_invoker::parse_cli();

    // `<project_dir>/.env` feeds the env-backed flags, so parse once more
    // after loading it.
    let env_loaded = luapack_invoker::load_project_env(&cli.project_dir);
    if matches!(env_loaded, Ok(true)) {
        cli = luapack_invoker::parse_cli();
    }

    luapack_invoker::init_tracing(cli.verbose);
    if let Err(e) = &env_loaded {
        tracing::warn!(error = %e, "ignoring unreadable .env");
    }

    let exit_code = match luapack_invoker::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };

    process::exit(exit_code);
}
