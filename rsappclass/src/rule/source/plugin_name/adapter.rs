//! 插件名称适配器
//! 每个插件文件生成一条无信号规则，只作为低置信度的标签兜底

use rsappclass_engine::Rule;
use std::path::Path;

use crate::error::RsAppResult;
use crate::rule::source::base_adapter::{ensure_source_root, file_stem, find_dirs_named, list_files_with_ext};
use crate::rule::source::{RuleSourceAdapter, SourceKind};

#[derive(Debug, Clone, Default)]
pub struct PluginNameAdapter;

impl RuleSourceAdapter for PluginNameAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::PluginName
    }

    fn build_rules(&self, root: &Path, max_rules: usize) -> RsAppResult<Vec<Rule>> {
        ensure_source_root(root)?;
        let mut rules = Vec::new();
        if max_rules == 0 {
            return Ok(rules);
        }

        for plugin_dir in find_dirs_named(root, "plugins") {
            for file in list_files_with_ext(&plugin_dir, "rb") {
                let Some(name) = file_stem(&file) else {
                    continue;
                };
                rules.push(Rule::new(
                    format!("whatweb-{}", name),
                    format!("WhatWeb: {}", name),
                    SourceKind::PluginName.weight(),
                ));
                if rules.len() >= max_rules {
                    log::info!("[PluginName] rule cap reached: {}", max_rules);
                    return Ok(rules);
                }
            }
        }

        Ok(rules)
    }
}
