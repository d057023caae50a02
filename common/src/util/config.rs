use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Path search selector. Only Dijkstra is implemented; the value is carried
/// for identification in logs and reports.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Dijkstra,
}

/// Which routed point a sink's search starts from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPolicy {
    /// Always the net's source pin.
    #[default]
    Source,
    /// The source or already-routed pip endpoint closest to the sink.
    Nearest,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default)]
    pub search_mode: SearchMode,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_confirm_area_threshold")]
    pub confirm_area_threshold: u64,
    #[serde(default)]
    pub start_policy: StartPolicy,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::default(),
            max_depth: default_max_depth(),
            confirm_area_threshold: default_confirm_area_threshold(),
            start_policy: StartPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    #[serde(default = "default_expand_margin")]
    pub expand_margin: i32,
    /// `[min_x, min_y, max_x, max_y]` selected before routing starts.
    #[serde(default)]
    pub initial_region: Option<[i32; 4]>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            expand_margin: default_expand_margin(),
            initial_region: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_fabric_file")]
    pub fabric_file: String,
    #[serde(default = "default_netlist_file")]
    pub netlist_file: String,
    #[serde(default = "default_output_netlist")]
    pub output_netlist: String,
    #[serde(default = "default_visualization")]
    pub visualization: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            fabric_file: default_fabric_file(),
            netlist_file: default_netlist_file(),
            output_netlist: default_output_netlist(),
            visualization: default_visualization(),
        }
    }
}

fn default_max_depth() -> usize {
    100
}

fn default_confirm_area_threshold() -> u64 {
    4
}

fn default_expand_margin() -> i32 {
    1
}

fn default_fabric_file() -> String {
    "inputs/fabric.txt".to_string()
}

fn default_netlist_file() -> String {
    "inputs/netlist.txt".to_string()
}

fn default_output_netlist() -> String {
    "output/routed.txt".to_string()
}

fn default_visualization() -> Option<String> {
    Some("output/routed.png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.routing.max_depth, 100);
        assert_eq!(config.routing.confirm_area_threshold, 4);
        assert_eq!(config.routing.search_mode, SearchMode::Dijkstra);
        assert_eq!(config.routing.start_policy, StartPolicy::Source);
        assert_eq!(config.selection.expand_margin, 1);
        assert!(config.selection.initial_region.is_none());
        assert_eq!(config.input.fabric_file, "inputs/fabric.txt");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = r#"
            [routing]
            start_policy = "Nearest"
            max_depth = 12

            [selection]
            initial_region = [0, 0, 3, 2]
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.routing.start_policy, StartPolicy::Nearest);
        assert_eq!(config.routing.max_depth, 12);
        assert_eq!(config.routing.confirm_area_threshold, 4);
        assert_eq!(config.selection.initial_region, Some([0, 0, 3, 2]));
        assert_eq!(config.selection.expand_margin, 1);
    }

    #[test]
    fn unknown_search_mode_is_rejected() {
        assert!(toml::from_str::<Config>("[routing]\nsearch_mode = \"BFS\"\n").is_err());
    }
}
