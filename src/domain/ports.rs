use crate::domain::model::Device;
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// `None` means "restore from the autosave snapshot".
    fn input_path(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn name_mapping_path(&self) -> &str;
    fn autosave_path(&self) -> &str;
    fn track_removals(&self) -> bool;
    fn template_devices(&self) -> Option<&[Device]>;
}
