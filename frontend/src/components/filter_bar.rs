use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::services::FilterSelection;

#[derive(Properties, PartialEq)]
pub struct FilterBarProps {
    pub years: Vec<i32>,
    pub divisions: Vec<String>,
    pub lead_types: Vec<String>,
    pub selection: FilterSelection,
    pub on_change: Callback<FilterSelection>,
}

fn selected_value(e: &Event) -> Option<String> {
    let value = e.target_dyn_into::<HtmlSelectElement>()?.value();
    (!value.is_empty()).then_some(value)
}

#[function_component(FilterBar)]
pub fn filter_bar(props: &FilterBarProps) -> Html {
    let on_year = {
        let selection = props.selection.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let year = selected_value(&e).and_then(|v| v.parse::<i32>().ok());
            on_change.emit(FilterSelection { year, ..selection.clone() });
        })
    };

    let on_division = {
        let selection = props.selection.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            on_change.emit(FilterSelection {
                division: selected_value(&e),
                ..selection.clone()
            });
        })
    };

    let on_lead_type = {
        let selection = props.selection.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            on_change.emit(FilterSelection {
                lead_type: selected_value(&e),
                ..selection.clone()
            });
        })
    };

    let on_clear = {
        let on_change = props.on_change.clone();
        Callback::from(move |_: MouseEvent| on_change.emit(FilterSelection::default()))
    };

    let year_text = props.selection.year.map(|y| y.to_string());

    html! {
        <div class="flex flex-wrap items-end gap-4 bg-gray-800 rounded-lg border border-gray-700 p-4">
            { select("Year", props.years.iter().map(|y| y.to_string()).collect(), year_text, on_year) }
            { select("Division", props.divisions.clone(), props.selection.division.clone(), on_division) }
            { select("Lead Type", props.lead_types.clone(), props.selection.lead_type.clone(), on_lead_type) }
            <button
                class="bg-gray-600 hover:bg-gray-500 text-white px-4 py-2 rounded-lg disabled:opacity-50"
                disabled={props.selection.is_empty()}
                onclick={on_clear}
            >
                {"Clear"}
            </button>
        </div>
    }
}

fn select(label: &str, options: Vec<String>, current: Option<String>, onchange: Callback<Event>) -> Html {
    let current = current.unwrap_or_default();
    html! {
        <label class="flex flex-col text-sm text-gray-400">
            {label}
            <select class="mt-1 bg-gray-900 border border-gray-600 text-white rounded px-3 py-2" {onchange}>
                <option value="" selected={current.is_empty()}>{"All"}</option>
                { for options.into_iter().map(|option| {
                    let selected = option == current;
                    html! { <option value={option.clone()} {selected}>{option}</option> }
                }) }
            </select>
        </label>
    }
}
