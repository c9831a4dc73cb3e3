//! LDAP pillar source

use saltldap_core::{
    ConnectionParams, Directory, DirectoryResult, PillarData, SearchEntry, SearchSpec,
    TemplateRenderer,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::PillarConfig;
use crate::error::PillarResult;
use crate::flatten::flatten_entry;

/// Runs the searches described by a pillar config file
pub struct LdapPillar {
    directory: Arc<dyn Directory>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl LdapPillar {
    pub fn new(directory: Arc<dyn Directory>, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            directory,
            renderer,
        }
    }

    /// Execute the configured searches and return the aggregated data
    ///
    /// A missing or unusable config file yields empty data. The only
    /// error is a search source without a filter.
    pub async fn fetch(&self, config_path: &Path, grains: &Value) -> PillarResult<PillarData> {
        let config = match self.load_config(config_path, grains).await {
            Some(config) => config,
            None => return Ok(PillarData::new()),
        };

        let mut data = PillarData::new();
        for source in &config.search_order {
            let definition = match config.definition(source) {
                Some(Ok(definition)) => definition,
                Some(Err(e)) => {
                    error!("Skipping pillar source {}: {}", source, e);
                    continue;
                }
                None => {
                    warn!("No search definition for pillar source {}", source);
                    continue;
                }
            };

            let (params, spec) = definition.to_request(source)?;
            match self.search(&params, &spec).await {
                Ok(entries) => {
                    if entries.len() > 1 {
                        debug!(
                            "Pillar source {} matched {} entries, using the first",
                            source,
                            entries.len()
                        );
                    }
                    if let Some(entry) = entries.first() {
                        data.extend(flatten_entry(&entry.attrs, definition.composite_attrs()));
                    }
                }
                Err(e) => {
                    error!(
                        "Failed to retrieve pillar data from LDAP source {}: {}",
                        source, e
                    );
                }
            }
        }

        Ok(data)
    }

    /// Render and parse the config file, `None` when there is nothing usable
    pub async fn load_config(&self, config_path: &Path, grains: &Value) -> Option<PillarConfig> {
        if !config_path.is_file() {
            debug!("Missing configuration file: {}", config_path.display());
            return None;
        }

        match self.read_config(config_path, grains).await {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(
                    "Error parsing configuration file: {} - {}",
                    config_path.display(),
                    e
                );
                None
            }
        }
    }

    async fn read_config(&self, config_path: &Path, grains: &Value) -> PillarResult<PillarConfig> {
        let template = tokio::fs::read_to_string(config_path).await?;
        let rendered = self.renderer.render(&template, grains)?;
        PillarConfig::parse(&rendered)
    }

    async fn search(
        &self,
        params: &ConnectionParams,
        spec: &SearchSpec,
    ) -> DirectoryResult<Vec<SearchEntry>> {
        let mut session = self.directory.bind(params).await?;
        let result = session.search(spec).await;
        let _ = session.unbind().await;
        result
    }
}
