//! Resource and data source traits

use crate::diagnostics::Diagnostics;
use crate::error::{CloudError, Result};
use crate::resource_data::{DEFAULT_TIMEOUT, ResourceData};
use crate::schema::Schema;
use async_trait::async_trait;
use stratoflow_core::{Attributes, Timeouts};

/// A managed remote object
///
/// `read` must call [`ResourceData::clear_id`] when the remote object no
/// longer exists instead of returning an error.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name used in configuration (e.g. "civo_network")
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn default_timeouts(&self) -> Timeouts {
        Timeouts::all(DEFAULT_TIMEOUT)
    }

    /// Cross-attribute checks that the schema cannot express
    fn validate(&self, _config: &Attributes) -> Diagnostics {
        Diagnostics::new()
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()>;

    async fn read(&self, data: &mut ResourceData) -> Result<()>;

    async fn update(&self, data: &mut ResourceData) -> Result<()>;

    async fn delete(&self, data: &mut ResourceData) -> Result<()>;

    /// Bind an existing remote object by ID
    async fn import(&self, id: &str, data: &mut ResourceData) -> Result<()> {
        data.set_id(id);
        self.read(data).await?;
        if data.id().is_none() {
            return Err(CloudError::ResourceNotFound(format!(
                "{} with ID {}",
                self.type_name(),
                id
            )));
        }
        Ok(())
    }
}

/// A read-only lookup of existing remote state
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, data: &mut ResourceData) -> Result<()>;
}
