/// Unit tests for the unification and aggregation engine
/// Tests group identity keys, listing de-duplication, unit resolution and
/// the financial roll-up
use fichapro_api::models::{NumericValue, Property, PropertyStatus};
use fichapro_api::portfolio::{
    aggregate, aggregate_units, complex_key, group_key, normalize_name, resolve_units, unify,
    CategoryFilter, GroupResolution, ListingFilters,
};
use uuid::Uuid;

fn prop(name: &str, is_complex: bool) -> Property {
    Property {
        id: Uuid::new_v4(),
        name: name.to_string(),
        is_complex,
        fiche_available: true,
        ..Default::default()
    }
}

#[cfg(test)]
mod identity_keys {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["Complexo Agamenón", "  GALPÃO São João  ", "loja 12", ""] {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "failed for {:?}", raw);
        }
    }

    #[test]
    fn keys_are_accent_and_case_insensitive() {
        let expected = Some("complexo agamenon".to_string());
        assert_eq!(complex_key("Complexo Agamenón"), expected);
        assert_eq!(complex_key("complexo agamenon"), expected);
        assert_eq!(complex_key("COMPLEXO AGAMENON  "), expected);
    }

    #[test]
    fn pattern_key_ignores_unit_suffix() {
        assert_eq!(
            complex_key("Complexo Agamenon - Loja 1"),
            complex_key("Complexo Agamenon - Loja 2")
        );
    }

    #[test]
    fn pattern_found_anywhere_in_name() {
        assert_eq!(
            complex_key("Galpões do Complexo Trindade (fundos)"),
            Some("complexo trindade".to_string())
        );
    }

    #[test]
    fn no_pattern_yields_no_complex_key() {
        assert_eq!(complex_key("Sede Administrativa"), None);
        assert_eq!(complex_key("Complexo"), None); // no word after the marker
    }

    #[test]
    fn group_key_falls_back_to_full_name() {
        assert_eq!(
            group_key("Galpão Central"),
            Some("galpao central".to_string())
        );
        assert_eq!(
            group_key("Complexo Agamenon - Loja 1"),
            Some("complexo agamenon".to_string())
        );
    }

    #[test]
    fn empty_names_are_ungroupable() {
        assert_eq!(group_key(""), None);
        assert_eq!(group_key("   "), None);
    }
}

#[cfg(test)]
mod list_deduplication {
    use super::*;

    #[test]
    fn first_occurrence_wins() {
        let records = vec![
            prop("Complexo X", true),
            prop("Complexo X Unit 2", true),
            prop("Complexo X Unit 3", true),
        ];
        let listing = unify(&records, &ListingFilters::default());

        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, records[0].id);
    }

    #[test]
    fn parent_linked_units_are_always_hidden() {
        let mut child = prop("Complexo Z - Loja 1", true);
        child.parent_id = Some(Uuid::new_v4());

        let records = vec![child];
        let listing = unify(&records, &ListingFilters::default());
        assert!(listing.is_empty());

        // Even a matching search does not resurface it
        let filters = ListingFilters {
            search: Some("Loja 1".to_string()),
            ..Default::default()
        };
        assert!(unify(&records, &filters).is_empty());
    }

    #[test]
    fn non_complex_records_are_never_collapsed() {
        let records = vec![prop("Loja Centro", false), prop("Loja Centro", false)];
        let listing = unify(&records, &ListingFilters::default());
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn exact_name_fallback_merges() {
        // No "complexo <word>" pattern: identical normalized names merge
        let records = vec![prop("Sede Administrativa", true), prop("sede administrativa ", true)];
        let listing = unify(&records, &ListingFilters::default());
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, records[0].id);
    }

    #[test]
    fn empty_named_complexes_are_not_merged() {
        let records = vec![prop("", true), prop("", true)];
        let listing = unify(&records, &ListingFilters::default());
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn hidden_first_representative_still_suppresses_duplicates() {
        let mut first = prop("Complexo Y", true);
        first.city = Some("São Paulo".to_string());
        let mut second = prop("Complexo Y - Loja 2", true);
        second.city = Some("Rio de Janeiro".to_string());

        let records = vec![first, second];
        let filters = ListingFilters {
            city: Some("Rio de Janeiro".to_string()),
            ..Default::default()
        };

        // The first representative claimed the group key before failing the
        // city filter, so the second record stays suppressed too
        assert!(unify(&records, &filters).is_empty());
    }

    #[test]
    fn search_covers_name_address_city_and_registration() {
        let mut a = prop("Galpão Norte", false);
        a.registration = Some("REG-0042".to_string());
        let mut b = prop("Loja Sul", false);
        b.address = Some("Av. Brasil".to_string());
        let records = vec![a, b];

        let by_registration = ListingFilters {
            search: Some("reg-0042".to_string()),
            ..Default::default()
        };
        let listing = unify(&records, &by_registration);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "Galpão Norte");

        let by_address = ListingFilters {
            search: Some("brasil".to_string()),
            ..Default::default()
        };
        let listing = unify(&records, &by_address);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "Loja Sul");
    }

    #[test]
    fn status_and_category_filters_are_exact() {
        let mut leased = prop("Loja A", false);
        leased.status = PropertyStatus::Locado;
        let available = prop("Complexo B", true);
        let records = vec![leased, available];

        let by_status = ListingFilters {
            status: Some(PropertyStatus::Locado),
            ..Default::default()
        };
        assert_eq!(unify(&records, &by_status).len(), 1);

        let complexes_only = ListingFilters {
            category: Some(CategoryFilter::Complex),
            ..Default::default()
        };
        let listing = unify(&records, &complexes_only);
        assert_eq!(listing.len(), 1);
        assert!(listing[0].is_complex);
    }

    #[test]
    fn surviving_records_keep_input_order() {
        let records = vec![
            prop("Armazém 1", false),
            prop("Complexo Dois", true),
            prop("Galpão 3", false),
        ];
        let listing = unify(&records, &ListingFilters::default());
        let names: Vec<&str> = listing.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Armazém 1", "Complexo Dois", "Galpão 3"]);
    }
}

#[cfg(test)]
mod unit_resolution {
    use super::*;

    #[test]
    fn explicit_linkage_short_circuits_name_matching() {
        let canonical = prop("Complexo Agamenon", true);
        let mut linked = prop("Unidade 7", false);
        linked.parent_id = Some(canonical.id);
        // Same name pattern, but unrelated: must be ignored once a
        // parent_id child exists
        let fuzzy = prop("Complexo Agamenon - Loja 2", true);

        let all = vec![canonical.clone(), linked.clone(), fuzzy];
        let (units, resolution) = resolve_units(&canonical, &all);

        assert_eq!(resolution, GroupResolution::ExplicitLink);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id, linked.id);
    }

    #[test]
    fn pattern_match_groups_complex_records() {
        let canonical = prop("Complexo Agamenon", true);
        let sibling = prop("Complexo Agamenón - Loja 2", true);
        let unrelated = prop("Complexo Trindade", true);

        let all = vec![canonical.clone(), sibling.clone(), unrelated];
        let (units, resolution) = resolve_units(&canonical, &all);

        assert_eq!(resolution, GroupResolution::PatternMatch);
        let ids: Vec<Uuid> = units.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![canonical.id, sibling.id]);
    }

    #[test]
    fn pattern_match_requires_complex_flag() {
        let canonical = prop("Complexo Agamenon", true);
        let plain = prop("Complexo Agamenon - Estacionamento", false);

        let all = vec![canonical.clone(), plain];
        let (units, _) = resolve_units(&canonical, &all);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id, canonical.id);
    }

    #[test]
    fn exact_name_fallback_when_no_pattern() {
        let canonical = prop("Sede Norte", true);
        let twin = prop("SEDE NORTE", true);
        let other = prop("Sede Sul", true);

        let all = vec![canonical.clone(), twin.clone(), other];
        let (units, resolution) = resolve_units(&canonical, &all);

        assert_eq!(resolution, GroupResolution::ExactNameMatch);
        let ids: Vec<Uuid> = units.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![canonical.id, twin.id]);
    }
}

#[cfg(test)]
mod aggregation {
    use super::*;

    #[test]
    fn currency_strings_coerce() {
        assert_eq!(
            NumericValue::Text("R$ 1.234,56".to_string()).as_number(),
            1234.56
        );
        assert_eq!(NumericValue::Text(String::new()).as_number(), 0.0);
        assert_eq!(NumericValue::Text("abc".to_string()).as_number(), 0.0);
        assert_eq!(NumericValue::Empty.as_number(), 0.0);
        assert_eq!(NumericValue::Number(7.5).as_number(), 7.5);
    }

    #[test]
    fn built_area_sums_across_units() {
        let mut a = prop("Complexo K - 1", true);
        a.built_area = NumericValue::Number(100.0);
        let mut b = prop("Complexo K - 2", true);
        b.built_area = NumericValue::Text("150,5".to_string());
        let mut c = prop("Complexo K - 3", true);
        c.built_area = NumericValue::Empty;

        let units = vec![&a, &b, &c];
        let totals = aggregate_units(&units);
        assert_eq!(totals.built_area, 250.5);
    }

    #[test]
    fn zero_market_value_yields_zero_yield() {
        let mut a = prop("Complexo Vazio", true);
        a.market_rent = NumericValue::Number(5_000.0);
        a.market_value = NumericValue::Number(0.0);
        a.built_area = NumericValue::Empty;

        let units = vec![&a];
        let totals = aggregate_units(&units);
        assert_eq!(totals.rent_dy, 0.0);
        assert_eq!(totals.rent_sqm, 0.0);
        assert!(totals.rent_dy.is_finite());
    }

    #[test]
    fn derived_ratios_come_from_the_sums() {
        let mut a = prop("Complexo W - 1", true);
        a.market_value = NumericValue::Number(600_000.0);
        a.market_rent = NumericValue::Number(6_000.0);
        a.built_area = NumericValue::Number(300.0);
        let mut b = prop("Complexo W - 2", true);
        b.market_value = NumericValue::Number(400_000.0);
        b.market_rent = NumericValue::Number(4_000.0);
        b.built_area = NumericValue::Number(200.0);

        let units = vec![&a, &b];
        let totals = aggregate_units(&units);
        // 10_000 * 12 / 1_000_000 * 100 = 12%
        assert!((totals.rent_dy - 12.0).abs() < 1e-9);
        // 10_000 / 500 = 20
        assert!((totals.rent_sqm - 20.0).abs() < 1e-9);
    }

    #[test]
    fn registry_fields_concatenate_without_dedup() {
        let mut a = prop("Complexo M - 1", true);
        a.matricula = Some("123".to_string());
        let mut b = prop("Complexo M - 2", true);
        b.matricula = Some(String::new());
        let mut c = prop("Complexo M - 3", true);
        c.matricula = Some("123".to_string());
        c.sequencial = Some("9".to_string());

        let units = vec![&a, &b, &c];
        let totals = aggregate_units(&units);
        assert_eq!(totals.matricula, "123, 123");
        assert_eq!(totals.sequencial, "9");
    }

    #[test]
    fn non_complex_records_surface_their_own_figures() {
        let mut single = prop("Loja Única", false);
        single.market_value = NumericValue::Text("R$ 900.000,00".to_string());
        single.rent_dy = NumericValue::Text("7,2".to_string());

        let all = vec![single.clone()];
        let view = aggregate(&single, &all);

        assert!(view.resolution.is_none());
        assert_eq!(view.unit_count, 0);
        assert_eq!(view.totals.market_value, 900_000.0);
        // Stored ratio used directly, never recomputed
        assert_eq!(view.totals.rent_dy, 7.2);
    }

    #[test]
    fn lone_complex_aggregates_over_itself() {
        let mut lone = prop("Complexo Solitário", true);
        lone.market_value = NumericValue::Number(100_000.0);
        lone.market_rent = NumericValue::Number(1_000.0);
        lone.built_area = NumericValue::Number(50.0);
        // A stored ratio that must be ignored in favor of the computed one
        lone.rent_dy = NumericValue::Number(99.0);

        let all = vec![lone.clone()];
        let view = aggregate(&lone, &all);

        assert_eq!(view.resolution, Some(GroupResolution::PatternMatch));
        assert_eq!(view.unit_count, 1);
        assert!((view.totals.rent_dy - 12.0).abs() < 1e-9);
        assert!((view.totals.rent_sqm - 20.0).abs() < 1e-9);
    }

    #[test]
    fn complex_detail_sums_its_resolved_group() {
        let canonical = prop("Complexo Porto", true);
        let mut u1 = prop("Unidade A", false);
        u1.parent_id = Some(canonical.id);
        u1.market_value = NumericValue::Number(250_000.0);
        let mut u2 = prop("Unidade B", false);
        u2.parent_id = Some(canonical.id);
        u2.market_value = NumericValue::Text("R$ 750.000,00".to_string());

        let all = vec![canonical.clone(), u1, u2];
        let view = aggregate(&canonical, &all);

        assert_eq!(view.resolution, Some(GroupResolution::ExplicitLink));
        assert_eq!(view.unit_count, 2);
        assert_eq!(view.totals.market_value, 1_000_000.0);
    }
}
