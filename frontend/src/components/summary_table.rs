use pipeline_shared::{Dimension, DrillTarget, Metric, SummaryFilter, SummaryRow};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct SummaryTableProps {
    pub dimension: Dimension,
    pub rows: Vec<SummaryRow>,
    /// Filter the rows were cut down with; total rows drill within it.
    #[prop_or_default]
    pub scope: SummaryFilter,
    pub on_drill: Callback<DrillTarget>,
}

/// Year × dimension table. Every non-zero metric cell opens its drill-through,
/// subtotal rows included.
#[function_component(SummaryTable)]
pub fn summary_table(props: &SummaryTableProps) -> Html {
    if props.rows.is_empty() {
        return html! {
            <div class="p-6 text-gray-400">{"No opportunities match the selected filters"}</div>
        };
    }

    html! {
        <div class="overflow-x-auto">
            <table class="min-w-full text-sm">
                <thead class="bg-gray-900">
                    <tr>
                        <th class="px-3 py-2 text-left text-gray-300">{"Year"}</th>
                        <th class="px-3 py-2 text-left text-gray-300">{props.dimension.label()}</th>
                        { for Metric::ALL.iter().map(|metric| html! {
                            <th class="px-3 py-2 text-right text-gray-300">{metric.header()}</th>
                        }) }
                    </tr>
                </thead>
                <tbody>
                    { for props.rows.iter().map(|row| summary_row(props, row)) }
                </tbody>
            </table>
        </div>
    }
}

fn summary_row(props: &SummaryTableProps, row: &SummaryRow) -> Html {
    let row_class = if row.is_grand_total() {
        "bg-gray-700 font-bold text-white"
    } else if row.is_total() {
        "bg-gray-750 font-semibold text-gray-100 border-b border-gray-600"
    } else {
        "text-gray-200 border-b border-gray-700"
    };

    html! {
        <tr class={row_class}>
            <td class="px-3 py-2">{row.year.to_string()}</td>
            <td class="px-3 py-2">{row.dimension.to_string()}</td>
            { for Metric::ALL.iter().map(|metric| metric_cell(props, row, *metric)) }
        </tr>
    }
}

fn metric_cell(props: &SummaryTableProps, row: &SummaryRow, metric: Metric) -> Html {
    let text = metric.display(row);
    if !metric.is_drillable(row) {
        return html! { <td class="px-3 py-2 text-right text-gray-500">{text}</td> };
    }

    let target = DrillTarget::new(props.dimension, row, metric).within(&props.scope);
    let title = target.title();
    let onclick = {
        let on_drill = props.on_drill.clone();
        Callback::from(move |_: MouseEvent| on_drill.emit(target.clone()))
    };

    html! {
        <td class="px-3 py-2 text-right">
            <button
                class="text-blue-400 hover:text-blue-300 hover:underline"
                {title}
                {onclick}
            >
                {text}
            </button>
        </td>
    }
}
