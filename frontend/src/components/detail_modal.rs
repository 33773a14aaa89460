use pipeline_shared::{format, DrillTarget, Opportunity};
use rust_decimal::Decimal;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::reports;

#[derive(Properties, PartialEq)]
pub struct DetailModalProps {
    pub target: DrillTarget,
    pub on_close: Callback<()>,
}

/// Records behind one summary cell.
#[function_component(DetailModal)]
pub fn detail_modal(props: &DetailModalProps) -> Html {
    let records = use_state(|| None::<Vec<Opportunity>>);
    let error = use_state(|| None::<String>);

    {
        let records = records.clone();
        let error = error.clone();

        use_effect_with(props.target.clone(), move |target| {
            records.set(None);
            error.set(None);
            let target = target.clone();
            spawn_local(async move {
                match reports::opportunity_detail(&target.detail_filter()).await {
                    Ok(response) => {
                        let mut data = response.data;
                        if target.requires_positive_amount() {
                            data.retain(|r| r.amount > Decimal::ZERO);
                        }
                        records.set(Some(data));
                    }
                    Err(e) => error.set(Some(e.message)),
                }
            });
            || ()
        });
    }

    let on_close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| on_close.emit(()))
    };

    let filter = props.target.detail_filter();
    let export_url = reports::detail_export_url(&filter);

    let body = if let Some(message) = (*error).clone() {
        html! {
            <div class="bg-red-900/50 border border-red-700 text-red-200 px-4 py-3 rounded-lg">
                {"Error loading details: "}{message}
            </div>
        }
    } else if let Some(data) = (*records).clone() {
        html! {
            <>
                <div class="flex items-center justify-between mb-3">
                    <span class="text-gray-300">{format!("{} records", format::count(data.len() as i64))}</span>
                    <a class="bg-green-600 hover:bg-green-700 text-white px-3 py-1 rounded" href={export_url}>
                        {"Export to Excel"}
                    </a>
                </div>
                <div class="overflow-auto max-h-96">
                    <table class="min-w-full text-sm">
                        <thead class="bg-gray-900 sticky top-0">
                            <tr>
                                { for ["Id", "Name", "Stage", "Division", "Lead Type", "Amount", "Created", "Year"]
                                    .iter()
                                    .map(|h| html! { <th class="px-3 py-2 text-left text-gray-300">{*h}</th> }) }
                            </tr>
                        </thead>
                        <tbody>
                            { for data.iter().map(detail_row) }
                        </tbody>
                    </table>
                </div>
            </>
        }
    } else {
        html! {
            <div class="flex justify-center items-center h-32">
                <div class="animate-spin rounded-full h-10 w-10 border-b-2 border-blue-500"></div>
            </div>
        }
    };

    html! {
        <div class="fixed inset-0 bg-black/60 flex items-center justify-center z-50">
            <div class="bg-gray-800 border border-gray-700 rounded-lg w-11/12 max-w-6xl p-6">
                <div class="flex items-start justify-between mb-4">
                    <h2 class="text-lg font-bold text-white">{props.target.title()}</h2>
                    <button class="text-gray-400 hover:text-white" onclick={on_close}>{"✕"}</button>
                </div>
                {body}
            </div>
        </div>
    }
}

fn stage_class(record: &Opportunity) -> &'static str {
    match record.stage_name.as_str() {
        pipeline_shared::STAGE_APPROVED => "text-green-400",
        pipeline_shared::STAGE_LOST => "text-red-400",
        _ => "text-yellow-400",
    }
}

fn detail_row(record: &Opportunity) -> Html {
    html! {
        <tr class="border-b border-gray-700 text-gray-200">
            <td class="px-3 py-1 font-mono text-xs">{&record.id}</td>
            <td class="px-3 py-1">{record.name.clone().unwrap_or_default()}</td>
            <td class={classes!("px-3", "py-1", stage_class(record))}>{&record.stage_name}</td>
            <td class="px-3 py-1">{&record.division}</td>
            <td class="px-3 py-1">{&record.lead_type}</td>
            <td class="px-3 py-1 text-right">{format::currency(record.amount)}</td>
            <td class="px-3 py-1">{format::date(Some(record.created_date))}</td>
            <td class="px-3 py-1">{record.year}</td>
        </tr>
    }
}
