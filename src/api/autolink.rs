//! Infer link templates from schema relation slots.
//!
//! Authors declare which schema each resource serves; a schema declares the
//! relations its instances have. [`auto_link`] connects the two: for every
//! relation slot of a resource's schemas that has no hand-written edge yet,
//! it picks the first resource serving the slot's target schema.

use super::types::{Api, LinkTemplate, ResourceId};
use crate::link::{LinkRelationLoader, SELF_RELATION};
use crate::schema::SchemaService;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

struct Candidate {
    id: ResourceId,
    default_schema: Option<String>,
    /// Response schemas of edges that existed before auto-linking
    response_schemas: BTreeSet<String>,
}

impl Candidate {
    fn serves(&self, target: &str, schemas: &dyn SchemaService) -> bool {
        self.default_schema
            .iter()
            .chain(self.response_schemas.iter())
            .any(|s| schemas.is_compatible(target, s))
    }
}

/// Add an edge for every undeclared relation slot of every resource.
///
/// Resources are visited in ascending path order. For each, the relation
/// slots of its default and response schemas are considered; the endpoint is
/// the resource itself if it serves the slot's target schema, otherwise the
/// first other resource (ascending path) that does. A `self` slot only ever
/// links a resource to itself. Slots whose relation the loader does not know
/// are skipped.
///
/// Returns the number of edges added.
pub fn auto_link(
    api: &mut Api,
    schemas: &dyn SchemaService,
    relations: &dyn LinkRelationLoader,
) -> usize {
    let mut candidates: Vec<(String, Candidate)> = api
        .root
        .walk()
        .into_iter()
        .map(|(path, template)| {
            (
                path,
                Candidate {
                    id: template.id.clone(),
                    default_schema: template.default_schema.clone(),
                    response_schemas: BTreeSet::new(),
                },
            )
        })
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let positions: HashMap<ResourceId, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, (_, c))| (c.id.clone(), i))
        .collect();

    for link in &api.link_templates {
        let Some(relation) = relations.load_link_relation(&link.relation) else {
            continue;
        };
        let Some(&index) = positions.get(&link.endpoint_id) else {
            continue;
        };
        let endpoint = &mut candidates[index].1;
        if let Some(schema) =
            link.effective_response_schema(&relation, endpoint.default_schema.as_deref())
        {
            endpoint.response_schemas.insert(schema);
        }
    }

    let mut declared: HashSet<(ResourceId, String)> = api
        .link_templates
        .iter()
        .map(|l| (l.referrer_id.clone(), l.relation.clone()))
        .collect();

    let mut added = Vec::new();
    for (path, referrer) in &candidates {
        let own_schemas: BTreeSet<&str> = referrer
            .default_schema
            .iter()
            .chain(referrer.response_schemas.iter())
            .map(String::as_str)
            .collect();

        for schema_uri in own_schemas {
            let Some(prototype) = schemas.resolve_prototype(schema_uri) else {
                continue;
            };
            for slot in &prototype.relation_slots {
                let key = (referrer.id.clone(), slot.relation.clone());
                if declared.contains(&key) {
                    continue;
                }
                if relations.load_link_relation(&slot.relation).is_none() {
                    debug!(relation = %slot.relation, path = %path, "Relation unknown; not auto-linked");
                    continue;
                }

                let endpoint = if slot.relation == SELF_RELATION {
                    referrer
                        .serves(&slot.target_schema, schemas)
                        .then_some(referrer)
                } else if referrer.serves(&slot.target_schema, schemas) {
                    Some(referrer)
                } else {
                    candidates
                        .iter()
                        .map(|(_, c)| c)
                        .find(|c| c.id != referrer.id && c.serves(&slot.target_schema, schemas))
                };

                if let Some(endpoint) = endpoint {
                    debug!(
                        referrer = %referrer.id,
                        relation = %slot.relation,
                        endpoint = %endpoint.id,
                        "Auto-linked relation"
                    );
                    added.push(LinkTemplate::new(
                        referrer.id.clone(),
                        slot.relation.clone(),
                        endpoint.id.clone(),
                    ));
                    declared.insert(key);
                }
            }
        }
    }

    let count = added.len();
    api.link_templates.extend(added);
    count
}
