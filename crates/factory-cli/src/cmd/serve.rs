use std::path::Path;

pub fn run(projects_root: &Path, port: u16) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(factory_server::serve(projects_root.to_path_buf(), port))
}
