use super::{ApiNavigator, Resource, ResourceMatch};
use crate::api::{Api, LinkRelation, LinkTemplate, ResourceTemplate, Verb};
use crate::error::NavError;
use crate::link::RelationCatalog;
use crate::model::DocumentModel;
use crate::runtime_config::{RuntimeConfig, TieBreak};
use crate::schema::{Prototype, RelationSlot, StaticSchemaService, ValueKind};
use crate::services::Services;
use std::collections::BTreeSet;
use std::sync::Arc;

fn relations() -> RelationCatalog {
    RelationCatalog::with_relations([
        LinkRelation::new("self", Verb::Get),
        LinkRelation::new("update", Verb::Save),
        LinkRelation::new("roster", Verb::Get),
        LinkRelation::new("team", Verb::Get),
    ])
}

fn schemas() -> StaticSchemaService {
    StaticSchemaService::new()
        .with_prototype(Prototype::new("Team").key_slot("teamId", ValueKind::Integer))
        .with_prototype(
            Prototype::new("Player")
                .key_slot("playerId", ValueKind::Text)
                .relation_slot(RelationSlot::new("team", "Team").bind("teamId", "teamRef")),
        )
}

fn services() -> Services {
    Services::new(Arc::new(schemas()), Arc::new(relations()))
}

fn teams_api() -> Api {
    Api::new(
        "http://a.example",
        ResourceTemplate::root().with_child(
            ResourceTemplate::new("teams", "teams").with_child(
                ResourceTemplate::new("team", "{teamId}")
                    .with_default_schema("Team")
                    .with_child(
                        ResourceTemplate::new("players", "players").with_child(
                            ResourceTemplate::new("player", "{playerId}")
                                .with_default_schema("Player"),
                        ),
                    ),
            ),
        ),
    )
    .with_link_template(LinkTemplate::new("team", "self", "team"))
    .with_link_template(LinkTemplate::new("team", "update", "team"))
    .with_link_template(
        LinkTemplate::new("team", "roster", "players").with_response_schema("PlayerList"),
    )
    .with_link_template(LinkTemplate::new("player", "team", "team"))
    .with_link_template(LinkTemplate::new("player", "self", "player"))
}

fn navigator(api: Api) -> ApiNavigator {
    ApiNavigator::new(api, services(), RuntimeConfig::default()).unwrap()
}

fn ids(matches: &[ResourceMatch]) -> Vec<&str> {
    matches.iter().map(|m| m.resource_id.as_str()).collect()
}

#[test]
fn test_literal_outranks_variable() {
    let api = Api::new(
        "http://a.example",
        ResourceTemplate::root()
            .with_child(ResourceTemplate::new("key", "{key}"))
            .with_child(ResourceTemplate::new("capricas", "capricas")),
    )
    .with_link_template(LinkTemplate::new("key", "self", "key"))
    .with_link_template(LinkTemplate::new("capricas", "self", "capricas"));
    let nav = navigator(api);

    let matches = nav.match_uri("http://a.example/capricas").unwrap();
    assert_eq!(ids(&matches), vec!["capricas", "key"]);
    assert_eq!(matches[0].score, 11);
    assert_eq!(matches[1].score, 7);
    assert_eq!(matches[1].get_path_param("key"), Some("capricas"));

    let matches = nav.match_uri("http://a.example/other").unwrap();
    assert_eq!(ids(&matches), vec!["key"]);
}

#[test]
fn test_nested_match_captures_parameters() {
    let nav = navigator(teams_api());
    let best = nav.best_match("http://a.example/teams/42/players/ann").unwrap();
    assert_eq!(best.resource_id.as_str(), "player");
    assert_eq!(best.get_path_param("teamId"), Some("42"));
    assert_eq!(best.get_path_param("playerId"), Some("ann"));
    // teams(11) + {teamId}(7) + players(13) + {playerId}(9 + leaf)
    assert_eq!(best.score, 41);
}

#[test]
fn test_node_without_links_is_not_a_target() {
    let nav = navigator(teams_api());
    assert!(nav.match_uri("http://a.example/teams").unwrap().is_empty());
    let err = nav.get_resource_template_id("http://a.example/teams").unwrap_err();
    assert!(matches!(err, NavError::NoMatch { .. }));
}

#[test]
fn test_root_shortcut() {
    let nav = navigator(teams_api());
    for uri in ["http://a.example", "http://a.example/", "http://a.example?x=1"] {
        let id = nav.get_resource_template_id(uri).unwrap();
        assert_eq!(id.as_str(), "/");
    }
}

#[test]
fn test_unmanaged_uri() {
    let nav = navigator(teams_api());
    for uri in ["http://b.example/teams/1", "http://a.examplex/teams/1", "/teams/1"] {
        let err = nav.match_uri(uri).unwrap_err();
        assert!(matches!(err, NavError::UnmanagedUri { .. }), "{uri}");
    }
}

#[test]
fn test_base_path_ignores_empty_segments() {
    let mut api = teams_api();
    api.uri = "http://a.example/v2".to_string();
    let nav = navigator(api);

    for uri in [
        "http://a.example/v2/teams/42",
        "http://a.example//v2/teams/42",
        "http://A.example/v2//teams/42",
    ] {
        let id = nav.get_resource_template_id(uri).unwrap();
        assert_eq!(id.as_str(), "team", "{uri}");
    }
    for uri in ["http://a.example/v20/teams/42", "http://a.example/teams/42"] {
        let err = nav.match_uri(uri).unwrap_err();
        assert!(matches!(err, NavError::UnmanagedUri { .. }), "{uri}");
    }
}

#[test]
fn test_trailing_slash_and_query_are_ignored() {
    let nav = navigator(teams_api());
    let id = nav
        .get_resource_template_id("http://a.example/teams/42/?view=full")
        .unwrap();
    assert_eq!(id.as_str(), "team");
}

#[test]
fn test_ties_are_all_retained() {
    let api = Api::new(
        "http://a.example",
        ResourceTemplate::root()
            .with_child(ResourceTemplate::new("zeta", "{z}"))
            .with_child(ResourceTemplate::new("alpha", "{a}")),
    )
    .with_link_template(LinkTemplate::new("zeta", "self", "zeta"))
    .with_link_template(LinkTemplate::new("alpha", "self", "alpha"));

    let discovery = navigator(api.clone());
    let matches = discovery.match_uri("http://a.example/x").unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].score, matches[1].score);

    let config = RuntimeConfig {
        tie_break: TieBreak::Lexical,
        ..RuntimeConfig::default()
    };
    let lexical = ApiNavigator::new(api, services(), config).unwrap();
    let matches = lexical.match_uri("http://a.example/x").unwrap();
    // full paths are "/{a}" and "/{z}"
    assert_eq!(ids(&matches), vec!["alpha", "zeta"]);
}

type Expected = (BTreeSet<String>, BTreeSet<String>, BTreeSet<String>);

/// Per-verb indices of `endpoint` recomputed straight from the raw templates.
fn expected_indices(api: &Api, endpoint: &Resource, verb: Verb) -> Expected {
    let catalog = relations();
    let mut expected = Expected::default();
    for lt in api.link_templates.iter().filter(|lt| lt.endpoint_id == *endpoint.id()) {
        let Some(rel) = crate::link::LinkRelationLoader::load_link_relation(&catalog, &lt.relation)
        else {
            continue;
        };
        if rel.verb != verb {
            continue;
        }
        expected.0.insert(lt.relation.clone());
        expected.1.extend(lt.effective_request_schema(&rel, endpoint.default_schema()));
        expected.2.extend(lt.effective_response_schema(&rel, endpoint.default_schema()));
    }
    expected
}

#[test]
fn test_indices_match_raw_link_templates() {
    let api = teams_api().with_link_template(
        LinkTemplate::new("player", "update", "team").with_request_schema("TeamPatch"),
    );
    let nav = navigator(api.clone());

    for resource in nav.resources() {
        for verb in Verb::ALL {
            let (relations, requests, responses) = expected_indices(&api, resource, verb);
            let actual_relations = resource.reference_relations(verb).cloned().unwrap_or_default();
            let actual_requests = resource.request_schemas(verb).cloned().unwrap_or_default();
            let actual_responses = resource.response_schemas(verb).cloned().unwrap_or_default();
            assert_eq!(actual_relations, relations, "relations {} {verb}", resource.id());
            assert_eq!(actual_requests, requests, "requests {} {verb}", resource.id());
            assert_eq!(actual_responses, responses, "responses {} {verb}", resource.id());
        }
    }

    let team = nav.resource("team").unwrap();
    assert_eq!(
        team.allowed_verbs().into_iter().collect::<Vec<_>>(),
        vec![Verb::Get, Verb::Save]
    );
    assert_eq!(
        team.request_schemas(Verb::Save).unwrap(),
        &BTreeSet::from(["Team".to_string(), "TeamPatch".to_string()])
    );
    assert!(team.request_schemas(Verb::Get).is_none());
    assert_eq!(team.outgoing_relations(), vec!["roster", "self", "update"]);
    assert_eq!(team.incoming_links("team").len(), 1);

    let rebuilt = navigator(api);
    let again = rebuilt.resource("team").unwrap();
    assert_eq!(again.response_schemas(Verb::Get), team.response_schemas(Verb::Get));
    assert_eq!(again.request_schemas(Verb::Save), team.request_schemas(Verb::Save));
    assert_eq!(
        again.reference_relations(Verb::Save),
        team.reference_relations(Verb::Save)
    );
}

#[test]
fn test_child_maps_split_literal_and_variable() {
    let nav = navigator(teams_api());
    let team = nav.resource("team").unwrap();
    assert!(team.is_variable());
    assert!(team.matches_segment("42"));
    assert_eq!(team.full_path(), "/teams/{teamId}");
    assert_eq!(team.parent_id().map(|p| p.as_str()), Some("teams"));
    assert!(team.literal_children().contains_key("players"));
    assert!(team.variable_children().is_empty());

    let players = nav.resource("players").unwrap();
    assert!(!players.is_variable());
    assert!(players.variable_children().contains_key("{playerId}"));
    assert!(!players.matches_segment("coaches"));
}

#[test]
fn test_surrogate_key_components_respect_schema() {
    let nav = navigator(teams_api());
    let components = nav
        .get_surrogate_key_components("http://a.example/teams/42", "Team")
        .unwrap()
        .unwrap();
    assert_eq!(components[0].1, "42");

    assert!(nav
        .get_surrogate_key_components("http://a.example/teams/42", "Color")
        .unwrap()
        .is_none());
}

#[test]
fn test_href_uses_relation_slot_binding() {
    let nav = navigator(teams_api());
    let uri = "http://a.example/teams/3/players/ann";

    let bound = DocumentModel::new("Player").with_slot("teamRef", 7);
    let href = nav.evaluate_href(&bound, uri, "team").unwrap();
    assert_eq!(href.as_deref(), Some("http://a.example/teams/7"));

    // without the bound slot the parameter falls back to the referrer URI
    let unbound = DocumentModel::new("Player");
    let href = nav.evaluate_href(&unbound, uri, "team").unwrap();
    assert_eq!(href.as_deref(), Some("http://a.example/teams/3"));

    assert_eq!(nav.evaluate_href(&unbound, uri, "missing").unwrap(), None);
}

#[test]
fn test_hrefs_lists_every_outgoing_relation() {
    let nav = navigator(teams_api());
    let team = DocumentModel::new("Team").with_slot("teamId", 5);
    let hrefs = nav.hrefs(&team, "http://a.example/teams/5").unwrap();
    assert_eq!(hrefs.len(), 3);
    assert_eq!(hrefs["roster"], "http://a.example/teams/5/players");
    assert_eq!(hrefs["self"], "http://a.example/teams/5");
}

#[test]
fn test_endpoint_resource_and_default_schema() {
    let nav = navigator(teams_api());
    let endpoint = nav
        .get_endpoint_resource("roster", "http://a.example/teams/1")
        .unwrap()
        .unwrap();
    assert_eq!(endpoint.id().as_str(), "players");
    assert_eq!(
        nav.default_response_schema("roster", "http://a.example/teams/1")
            .unwrap()
            .as_deref(),
        Some("PlayerList")
    );
    assert!(nav
        .get_endpoint_resource("nope", "http://a.example/teams/1")
        .unwrap()
        .is_none());
}

#[test]
fn test_unknown_relation_strict_and_lenient() {
    let api = teams_api().with_link_template(LinkTemplate::new("team", "mystery", "team"));

    let err = ApiNavigator::new(api.clone(), services(), RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, NavError::UnresolvableRelation { ref relation, .. } if relation == "mystery"));

    let lenient = RuntimeConfig {
        strict_relations: false,
        ..RuntimeConfig::default()
    };
    let nav = ApiNavigator::new(api, services(), lenient).unwrap();
    assert_eq!(nav.link_count(), 5);
    assert!(nav.resource("team").unwrap().outgoing_link("mystery").is_none());
}

#[test]
fn test_invalid_api_is_rejected() {
    let api = teams_api().with_link_template(LinkTemplate::new("team", "self", "ghost"));
    let err = ApiNavigator::new(api, services(), RuntimeConfig::default()).unwrap_err();
    match err {
        NavError::InvalidApi { issues, .. } => {
            assert!(issues.iter().any(|i| i.kind == "dangling_endpoint"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
