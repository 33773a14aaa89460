use pipeline_shared::filter::{dimension_values, years};
use pipeline_shared::rollup::{filter_summary, headline};
use pipeline_shared::{format, Dimension, DrillTarget, SummaryFilter, SummaryRow};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{DetailModal, FilterBar, MetricCard, SummaryTable};
use crate::services::{reports, FilterSelection};

#[derive(Debug, Clone, PartialEq, Default)]
struct Summaries {
    division: Vec<SummaryRow>,
    lead_type: Vec<SummaryRow>,
}

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let summaries = use_state(|| None::<Summaries>);
    let loading = use_state(|| true);
    let error = use_state(|| None::<String>);
    let reload = use_state(|| 0u32);
    let selection = use_state(FilterSelection::load);
    let tab = use_state(|| Dimension::Division);
    let drill = use_state(|| None::<DrillTarget>);

    // Both summaries, on mount and on refresh
    {
        let summaries = summaries.clone();
        let loading = loading.clone();
        let error = error.clone();

        use_effect_with(*reload, move |_| {
            loading.set(true);
            spawn_local(async move {
                let result = async {
                    let division = reports::summary(Dimension::Division).await?;
                    let lead_type = reports::summary(Dimension::LeadType).await?;
                    Ok::<_, crate::services::ApiError>(Summaries {
                        division: division.data,
                        lead_type: lead_type.data,
                    })
                }
                .await;

                match result {
                    Ok(data) => {
                        summaries.set(Some(data));
                        error.set(None);
                    }
                    Err(e) => error.set(Some(e.message)),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_refresh = {
        let reload = reload.clone();
        Callback::from(move |_: MouseEvent| reload.set(*reload + 1))
    };

    let on_filter = {
        let selection = selection.clone();
        Callback::from(move |next: FilterSelection| {
            next.save();
            selection.set(next);
        })
    };

    let on_drill = {
        let drill = drill.clone();
        Callback::from(move |target: DrillTarget| drill.set(Some(target)))
    };

    let on_close = {
        let drill = drill.clone();
        Callback::from(move |_: ()| drill.set(None))
    };

    if *loading {
        return html! {
            <div class="flex justify-center items-center h-64">
                <div class="animate-spin rounded-full h-12 w-12 border-b-2 border-blue-500"></div>
            </div>
        };
    }

    if let Some(error_msg) = (*error).clone() {
        return html! {
            <div class="p-6">
                <div class="bg-red-900/50 border border-red-700 text-red-200 px-4 py-3 rounded-lg">
                    {"Error loading pipeline summary: "}{error_msg}
                </div>
            </div>
        };
    }

    let data = match (*summaries).clone() {
        Some(data) => data,
        None => return html! { <div class="p-6 text-gray-400">{"No data available"}</div> },
    };

    let division_scope = SummaryFilter {
        year: selection.year,
        value: selection.division.clone(),
    };
    let lead_scope = SummaryFilter {
        year: selection.year,
        value: selection.lead_type.clone(),
    };
    let division_rows = filter_summary(&data.division, &division_scope);
    let lead_rows = filter_summary(&data.lead_type, &lead_scope);
    let totals = headline(&division_rows);

    let (active_rows, active_scope, active_dimension) = match *tab {
        Dimension::Division => (division_rows, division_scope, Dimension::Division),
        Dimension::LeadType => (lead_rows, lead_scope, Dimension::LeadType),
    };

    let tab_button = |dimension: Dimension, label: &'static str| {
        let tab = tab.clone();
        let active = *tab == dimension;
        let class = if active {
            "px-4 py-2 rounded-t-lg bg-gray-800 text-white border border-b-0 border-gray-700"
        } else {
            "px-4 py-2 rounded-t-lg text-gray-400 hover:text-white"
        };
        html! {
            <button {class} onclick={Callback::from(move |_: MouseEvent| tab.set(dimension))}>
                {label}
            </button>
        }
    };

    html! {
        <div class="p-6 space-y-6">
            // Header
            <div class="flex items-center justify-between">
                <div>
                    <h1 class="text-2xl font-bold text-white">{"Opportunity Pipeline"}</h1>
                    <p class="text-gray-400">{"Close rates and revenue by year, division and lead type"}</p>
                </div>
                <div class="flex space-x-2">
                    <a class="bg-green-600 hover:bg-green-700 text-white px-4 py-2 rounded-lg"
                        href={reports::summary_export_url(Dimension::Division)}>
                        {"Export Division"}
                    </a>
                    <a class="bg-green-600 hover:bg-green-700 text-white px-4 py-2 rounded-lg"
                        href={reports::summary_export_url(Dimension::LeadType)}>
                        {"Export Lead Type"}
                    </a>
                    <button class="bg-blue-600 hover:bg-blue-700 text-white px-4 py-2 rounded-lg" onclick={on_refresh}>
                        {"Refresh"}
                    </button>
                </div>
            </div>

            <FilterBar
                years={years(&data.division)}
                divisions={dimension_values(&data.division)}
                lead_types={dimension_values(&data.lead_type)}
                selection={(*selection).clone()}
                on_change={on_filter}
            />

            // Key metrics cards
            <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4">
                <MetricCard title="Total Opportunities" value={format::count(totals.total)} icon="list" color="blue" />
                <MetricCard title="Revenue" value={format::currency(totals.revenue)} icon="dollar" color="green" />
                <MetricCard title="Close Rate" value={format::percent(totals.close_rate_std())} icon="target" color="yellow" />
                <MetricCard title="Average Ticket" value={format::currency(totals.average_ticket())} icon="ticket" color="purple" />
            </div>

            <div>
                <div class="flex space-x-1">
                    { tab_button(Dimension::Division, "By Division") }
                    { tab_button(Dimension::LeadType, "By Lead Type") }
                </div>
                <div class="bg-gray-800 rounded-b-lg rounded-tr-lg border border-gray-700">
                    <SummaryTable dimension={active_dimension} rows={active_rows} scope={active_scope} on_drill={on_drill} />
                </div>
            </div>

            if let Some(target) = (*drill).clone() {
                <DetailModal {target} {on_close} />
            }
        </div>
    }
}
