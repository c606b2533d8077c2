/*
 * Copyright 2024 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use config::Case;
use config::Config;
use config::Environment;
use config::File;
use config::FileFormat;
use eyre::Context;

use crate::unresolved_config::UnresolvedRwVoltConfig;
use crate::RwVoltConfig;

const ENV_PREFIX: &str = "RWVOLT";

pub fn load_config(path: &str) -> eyre::Result<RwVoltConfig> {
    load_config_with_environment(path, environment_source())
}

/// Variables look like `RWVOLT_SAMPLER__INTERVAL_NS`: `__` separates sections,
/// key words are joined with `_` and converted to the kebab-case config keys.
pub(crate) fn environment_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .convert_case(Case::Kebab)
        .try_parsing(true)
}

pub(crate) fn load_config_with_environment(
    path: &str,
    environment_source: Environment,
) -> eyre::Result<RwVoltConfig> {
    let config_source = File::with_name(path)
        .required(true)
        .format(FileFormat::Toml);
    let config = Config::builder()
        .add_source(config_source)
        .add_source(environment_source)
        .build()
        .with_context(|| format!("Failed to load config from {path}"))?;

    let config: UnresolvedRwVoltConfig = config
        .try_deserialize()
        .with_context(|| format!("Failed to parse config at {path}"))?;
    config.resolve()
}
